//! Hashing primitives for the versioned catalog.
//!
//! Provides domain-separated BLAKE3 hashing for commits and verification of
//! parent-linked commit histories.
//!
//! All crypto operations wrap established libraries: no custom cryptography.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, HashLinked, HistoryVerifier};
pub use hasher::{ContentHasher, HasherError};
