//! *A crate for MevaCoin protocol constants and value types.*
//!
//! `mevacoin_protocol` contains the network constants for the MevaCoin main and test
//! networks, the consensus parameters that govern output unlock times, and types for
//! representing amounts of MEVA in atomic units.

// Catch documentation errors caused by code changes.
#![deny(rustdoc::broken_intra_doc_links)]

pub mod consensus;
pub mod constants;
pub mod value;

mod txid;
pub use txid::TxId;
