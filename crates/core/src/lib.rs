//! Stocklink Core - Shared domain types.
//!
//! This crate provides the durable domain records used across all Stocklink
//! components:
//! - `sync` - Marketplace synchronization pipeline
//! - `cli` - Command-line sync and log inspection tools
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, products, variants, the inventory ledger,
//!   sync log entries, and shop credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
