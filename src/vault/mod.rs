//! Vault module — the sealed entry store.
//!
//! This module provides:
//! - On-disk layout, atomic writes and base64 serde helpers (`format`)
//! - The master identity record, `config.json` (`identity`)
//! - Entry types and per-entry sealing (`entry`)
//! - The entry list, `sites.json`, and file blobs (`store`)
//! - The `VaultManager` facade used by commands (`manager`)

pub mod entry;
pub mod format;
pub mod identity;
pub mod manager;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{
    split_name, Credential, EntryContent, OpenedEntry, OpenedFields, SealedPayload, VaultEntry,
};
pub use identity::MasterIdentity;
pub use manager::VaultManager;
pub use store::{Group, Query, VaultStore};
