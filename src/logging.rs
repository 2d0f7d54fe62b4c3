/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Logger setup and helpers for formatting log lines.
//!
//! This crate logs using the [log](https://docs.rs/log/latest/log/) crate. To get its messages
//! printed onto a terminal or to a file, either set up your own
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations) or
//! call [`setup_logger`].
//!
//! ## Log message format
//!
//! Protocol log lines start with the identity of the replica that emitted them, as `S{shard}N{node}`,
//! followed by what happened and the relevant height or digest. Digests are printed as the first
//! seven characters of their Base64 encoding. For example, the following is printed when the leader
//! of shard 1 commits block 12:
//!
//! ```text
//! S1N0: adding block 12
//! ```
//!
//! ## Metrics
//!
//! Per-block metrics are logged on the [`METRICS_TARGET`] target as CSV rows, preceded once by a
//! CSV header (see [`LogMetricsSink`](crate::pbft::metrics::LogMetricsSink)). `setup_logger` keeps
//! them out of the terminal and, if asked to, writes them to a file of their own.

use std::{io, path::Path, thread};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use log::LevelFilter;

/// Log target of per-block metrics rows.
pub const METRICS_TARGET: &str = "shard_pbft::metrics";

/// Install a global logger that prints every record of level `level` and above to stdout, except
/// metrics rows, which go to `metrics_file` if one is given and are discarded otherwise.
///
/// Returns an error if the metrics file cannot be opened, or if a global logger was already set.
pub fn setup_logger(level: LevelFilter, metrics_file: Option<&Path>) -> Result<(), fern::InitError> {
    let console = fern::Dispatch::new()
        .filter(|metadata| metadata.target() != METRICS_TARGET)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:?}][{}] {}",
                thread::current().id(),
                record.level(),
                message
            ))
        })
        .chain(io::stdout());

    let mut dispatch = fern::Dispatch::new().level(level).chain(console);

    if let Some(path) = metrics_file {
        let metrics = fern::Dispatch::new()
            .filter(|metadata| metadata.target() == METRICS_TARGET)
            .format(|out, message, _| out.finish(format_args!("{}", message)))
            .chain(fern::log_file(path)?);
        dispatch = dispatch.chain(metrics);
    }

    dispatch.apply()?;
    Ok(())
}

/// Get a more readable representation of a byte sequence by base64-encoding it and taking the first
/// 7 characters.
pub(crate) fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}
