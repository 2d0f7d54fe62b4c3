/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Cryptographic primitives.
//!
//! All hashes in this crate are SHA256 hashes provided by the [`sha2`] crate.

use borsh::BorshSerialize;

use super::data_types::CryptoHash;

// re-exports below.
pub use sha2::Digest;
pub use sha2::Sha256 as CryptoHasher;

/// Hash the borsh serialization of `value`.
pub(crate) fn hash_borsh<T: BorshSerialize>(value: &T) -> Result<CryptoHash, std::io::Error> {
    let mut hasher = CryptoHasher::new();
    hasher.update(&value.try_to_vec()?);
    Ok(CryptoHash::new(hasher.finalize().into()))
}

/// Hash the concatenation of two hashes. Used to build interior nodes of Merkle trees.
pub(crate) fn hash_pair(left: &CryptoHash, right: &CryptoHash) -> CryptoHash {
    let mut hasher = CryptoHasher::new();
    hasher.update(left.bytes());
    hasher.update(right.bytes());
    CryptoHash::new(hasher.finalize().into())
}
