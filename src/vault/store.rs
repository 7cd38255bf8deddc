//! The vault record (`sites.json`) and the sealed file blobs next to it.
//!
//! `VaultStore` keeps the parsed entries together with the exact bytes
//! they were read from, because the tripwire HMAC is computed over the
//! raw bytes rather than the parsed structure.  The whole entry list is
//! the unit of update: every change rewrites the record atomically.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{PassVaultError, Result};

use super::entry::{is_valid_token, split_name, VaultEntry};
use super::format;

/// Which entries a lookup should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every entry.
    All,
    /// The entry with this full name, else the first whose leaf matches.
    One(String),
    /// Every entry whose full name contains this fragment.
    Search(String),
}

/// Entries sharing a group, ready for display.
///
/// An entry without a group forms a singleton `Group` with `name: None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<'a> {
    pub name: Option<String>,
    pub entries: Vec<&'a VaultEntry>,
}

impl Group<'_> {
    /// The label the group is sorted and shown under.
    pub fn label(&self) -> &str {
        match (&self.name, self.entries.first()) {
            (Some(name), _) => name.as_str(),
            (None, Some(entry)) => entry.leaf(),
            (None, None) => "",
        }
    }
}

/// The parsed vault record of one vault directory.
pub struct VaultStore {
    dir: PathBuf,
    entries: Vec<VaultEntry>,
    raw: Vec<u8>,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Write an empty vault record and the blob directory.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(format::files_dir(dir))?;
        let mut store = Self {
            dir: dir.to_path_buf(),
            entries: Vec::new(),
            raw: Vec::new(),
        };
        store.replace_all(Vec::new())?;
        Ok(store)
    }

    /// Read `sites.json`, keeping the raw bytes.
    pub fn load(dir: &Path) -> Result<Self> {
        let raw = format::read_record(&format::sites_path(dir))?;
        let entries: Vec<VaultEntry> = format::from_record_bytes(&raw, format::SITES_FILE)?;
        debug!("loaded {} entries from {}", entries.len(), dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
            raw,
        })
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// All entries, in stored order.
    pub fn entries(&self) -> &[VaultEntry] {
        &self.entries
    }

    /// The exact bytes of `sites.json` as last read or written.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// The entry whose full name is exactly `name`.
    pub fn find_one(&self, name: &str) -> Option<&VaultEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entries whose full name, group prefix included, contains `fragment`.
    pub fn find_matching(&self, fragment: &str) -> Vec<&VaultEntry> {
        self.entries
            .iter()
            .filter(|e| e.name.contains(fragment))
            .collect()
    }

    /// Resolve a query to a flat list, in stored order.
    pub fn select(&self, query: &Query) -> Vec<&VaultEntry> {
        match query {
            Query::All => self.entries.iter().collect(),
            Query::One(name) => self
                .find_one(name)
                .or_else(|| self.entries.iter().find(|e| e.leaf() == name))
                .into_iter()
                .collect(),
            Query::Search(fragment) => self.find_matching(fragment),
        }
    }

    /// Resolve a query and arrange the result for display.
    ///
    /// Entries are grouped by the text before the separator.  Groups are
    /// sorted case-insensitively by label, and entries by leaf name within
    /// a group.
    pub fn query(&self, query: &Query) -> Vec<Group<'_>> {
        group_entries(self.select(query))
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Append `entry`, refusing a name that is already taken.
    pub fn insert(&mut self, entry: VaultEntry) -> Result<()> {
        if self.contains(&entry.name) {
            return Err(PassVaultError::DuplicateName(entry.name));
        }
        let mut entries = self.entries.clone();
        entries.push(entry);
        self.replace_all(entries)
    }

    /// Replace the entry currently named `name`, keeping its position.
    pub fn replace(&mut self, name: &str, entry: VaultEntry) -> Result<()> {
        let index = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| PassVaultError::EntryNotFound(name.to_string()))?;
        if entry.name != name && self.contains(&entry.name) {
            return Err(PassVaultError::DuplicateName(entry.name));
        }
        let mut entries = self.entries.clone();
        entries[index] = entry;
        self.replace_all(entries)
    }

    /// Drop the entry named `name` and return it.
    pub fn remove(&mut self, name: &str) -> Result<VaultEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| PassVaultError::EntryNotFound(name.to_string()))?;
        let mut entries = self.entries.clone();
        let removed = entries.remove(index);
        self.replace_all(entries)?;
        Ok(removed)
    }

    /// Write `entries` as the whole vault record.
    ///
    /// All or nothing: the in-memory state only changes once the new
    /// record is on disk.
    pub fn replace_all(&mut self, entries: Vec<VaultEntry>) -> Result<()> {
        let raw = format::to_record_bytes(&entries)?;
        format::write_atomic(&format::sites_path(&self.dir), &raw)?;
        self.entries = entries;
        self.raw = raw;
        Ok(())
    }

    // ------------------------------------------------------------------
    // File blobs
    // ------------------------------------------------------------------

    fn blob_path(&self, token: &str) -> Result<PathBuf> {
        if !is_valid_token(token) {
            return Err(PassVaultError::InvalidVaultFormat(format!(
                "malformed blob token '{token}'"
            )));
        }
        Ok(format::files_dir(&self.dir).join(token))
    }

    pub fn write_blob(&self, token: &str, sealed: &[u8]) -> Result<()> {
        let path = self.blob_path(token)?;
        fs::create_dir_all(format::files_dir(&self.dir))?;
        format::write_atomic(&path, sealed)
    }

    pub fn read_blob(&self, token: &str) -> Result<Vec<u8>> {
        format::read_record(&self.blob_path(token)?)
    }

    /// Best-effort delete; a missing blob is not an error.
    pub fn remove_blob(&self, token: &str) -> Result<()> {
        match fs::remove_file(self.blob_path(token)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Move a blob aside so it can be restored if a later step fails.
    pub fn stage_blob(&self, token: &str) -> Result<PathBuf> {
        let path = self.blob_path(token)?;
        let staged = format::files_dir(&self.dir).join(format!(".{token}.removed"));
        fs::rename(&path, &staged)?;
        Ok(staged)
    }

    /// Put a staged blob back under its token.
    pub fn restore_blob(&self, staged: &Path, token: &str) -> Result<()> {
        fs::rename(staged, self.blob_path(token)?)?;
        Ok(())
    }
}

/// Group and sort entries for display.
pub fn group_entries(entries: Vec<&VaultEntry>) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();

    for entry in entries {
        match split_name(&entry.name).0 {
            Some(group) => match groups
                .iter_mut()
                .find(|g| g.name.as_deref() == Some(group))
            {
                Some(existing) => existing.entries.push(entry),
                None => groups.push(Group {
                    name: Some(group.to_string()),
                    entries: vec![entry],
                }),
            },
            None => groups.push(Group {
                name: None,
                entries: vec![entry],
            }),
        }
    }

    for group in &mut groups {
        group
            .entries
            .sort_by(|a, b| case_insensitive(a.leaf(), b.leaf()));
    }
    groups.sort_by(|a, b| case_insensitive(a.label(), b.label()));
    groups
}

/// Case-insensitive order, falling back to byte order for a stable result.
fn case_insensitive(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
