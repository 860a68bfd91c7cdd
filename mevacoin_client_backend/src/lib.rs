//! *A crate for implementing MevaCoin light wallets.*
//!
//! `mevacoin_client_backend` contains the chain-scanning side of a wallet: decoding
//! daemon sync payloads, detecting which outputs belong to a wallet's keys, classifying
//! them as unlocked or locked, and aggregating the result into balances.
//!
//! The crate deliberately contains no curve arithmetic. All elliptic-curve operations
//! are reached through the [`crypto::CryptoProvider`] trait, which the embedding
//! application implements over the chain's native cryptography.
//!
//! # Overview
//!
//! A scan proceeds in layers, each usable on its own:
//!
//! - [`wire`] decodes untrusted daemon JSON, running [`sanitize`] over it first so that
//!   numeric fields exceeding 2^53 − 1 are clamped before anything else sees them.
//! - [`scanning`] detects owned outputs in a block via trial key derivation against the
//!   wallet's view key and spend keys.
//! - [`wallet`] resolves each raw match into a canonical [`wallet::OwnedInput`] with
//!   its block provenance attached.
//! - [`balance`] folds classified inputs into unlocked/locked totals, merged and
//!   partitioned by spend key.
//! - [`sync`] drives the whole pipeline over an ordered batch of blocks, sequentially
//!   or across the rayon threadpool.

#![deny(rustdoc::broken_intra_doc_links)]

pub mod balance;
pub mod crypto;
pub mod keys;
pub mod sanitize;
pub mod scanning;
pub mod sync;
pub mod wallet;
pub mod wire;
