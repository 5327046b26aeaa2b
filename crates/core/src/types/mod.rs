//! Core types for Stocklink.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod id;
pub mod inventory;
pub mod log;
pub mod product;
pub mod shop;

pub use credential::{CredentialMap, CredentialPatch};
pub use id::*;
pub use inventory::{InventoryMovement, MovementKind};
pub use log::{LogLevel, LogLevelParseError, SyncLogEntry};
pub use product::{Product, Variant};
pub use shop::Shop;
