//! Stocklink Sync - Marketplace product synchronization pipeline.
//!
//! Pulls product catalogs from external commerce platforms through an
//! unreliable network boundary and reconciles them into the internal
//! product/variant model without creating duplicates or losing inventory
//! history.
//!
//! # Architecture
//!
//! - [`adapters`] - Platform adapters behind a registry; each adapter runs a
//!   resilient fetch protocol (bounded retries, token refresh, exponential
//!   backoff) and normalizes platform payloads into [`adapters::ExternalProduct`]
//! - [`reconcile`] - Idempotent create-or-update of products and variants,
//!   deterministic sku derivation, and the append-only inventory ledger
//! - [`store`] - Traits for the shop, product, and sync-log collaborators,
//!   plus in-memory reference implementations
//! - [`service`] - Ties a registry, stores, and the engine into a one-call
//!   shop sync
//!
//! Every protocol state transition is mirrored to the sync log; a failed log
//! write never breaks the pipeline (see [`logging`]).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod adapters;
pub mod config;
pub mod logging;
pub mod reconcile;
pub mod service;
pub mod store;

pub use adapters::{AdapterError, AdapterRegistry, ExternalProduct, ProductFetcher};
pub use config::{ConfigError, SyncConfig};
pub use logging::SyncLogger;
pub use reconcile::{ImportReport, ReconcileEngine, ReconcileError, UpsertOptions, UpsertOutcome};
pub use service::{SyncError, SyncOptions, SyncReport, SyncService};
pub use store::{ProductStore, ShopStore, StoreError, SyncLogStore};
