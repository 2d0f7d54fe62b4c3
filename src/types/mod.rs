//! Types that are used across the phase handlers, the relay dispatcher, and catch-up.
//!
//! Types specific to a single component live next to that component, e.g.,
//! [`crate::pbft::metrics`].

pub mod block;

pub mod crypto_primitives;

pub mod data_types;

pub mod merkle;

pub mod request;

pub mod transaction;
