use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::errors::{PassVaultError, Result};
use crate::generator::DEFAULT_PASSWORD_LENGTH;

/// Name of the vault directory under `$HOME` when nothing else is given.
pub const DEFAULT_DIR_NAME: &str = ".passvault";

/// Local settings, loaded from `<vault_dir>/settings.toml`.
///
/// Every field has a sensible default so passvault works out-of-the-box
/// without any settings file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Length used by `insert --generate` and `generate` without a length.
    #[serde(default = "default_password_length")]
    pub default_password_length: usize,

    /// Argon2 memory cost in KiB for new vaults (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count for new vaults (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree for new vaults (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Glyph set for the listing tree.
    #[serde(default)]
    pub tree_style: TreeStyle,

    /// Name of the git remote used by `pull` and `push`.
    #[serde(default = "default_git_remote")]
    pub git_remote: String,

    /// Branch used by `pull` and `push`.
    #[serde(default = "default_git_branch")]
    pub git_branch: String,
}

/// Which characters draw the listing tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeStyle {
    #[default]
    Unicode,
    Ascii,
}

/// Prefixes used to draw the listing tree.
///
/// Passed explicitly into the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeGlyphs {
    /// Before the last child of a level.
    pub last: &'static str,
    /// Before every other child.
    pub branch: &'static str,
    /// Continuation under a non-last parent.
    pub inner: &'static str,
    /// Continuation under the last parent.
    pub inner_last: &'static str,
}

impl TreeGlyphs {
    pub const UNICODE: TreeGlyphs = TreeGlyphs {
        last: "└──",
        branch: "├──",
        inner: "│  ",
        inner_last: "   ",
    };

    pub const ASCII: TreeGlyphs = TreeGlyphs {
        last: "+--",
        branch: "+--",
        inner: "|  ",
        inner_last: "   ",
    };
}

impl From<TreeStyle> for TreeGlyphs {
    fn from(style: TreeStyle) -> Self {
        match style {
            TreeStyle::Unicode => TreeGlyphs::UNICODE,
            TreeStyle::Ascii => TreeGlyphs::ASCII,
        }
    }
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_password_length() -> usize {
    DEFAULT_PASSWORD_LENGTH
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_git_remote() -> String {
    "pass-origin".to_string()
}

fn default_git_branch() -> String {
    "master".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_password_length: default_password_length(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            tree_style: TreeStyle::default(),
            git_remote: default_git_remote(),
            git_branch: default_git_branch(),
        }
    }
}

impl Settings {
    /// Name of the settings file inside the vault directory.
    pub const FILE_NAME: &'static str = "settings.toml";

    /// Load settings from `<vault_dir>/settings.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(vault_dir: &Path) -> Result<Self> {
        let path = vault_dir.join(Self::FILE_NAME);

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;

        toml::from_str(&contents).map_err(|e| {
            PassVaultError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    pub fn tree_glyphs(&self) -> TreeGlyphs {
        self.tree_style.into()
    }
}

/// Pick the vault directory: explicit flag or `PASSVAULT_DIR` first
/// (clap merges the two), then `$HOME/.passvault`.
pub fn resolve_vault_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    home_dir()
        .map(|home| home.join(DEFAULT_DIR_NAME))
        .ok_or_else(|| {
            PassVaultError::ConfigError(
                "cannot find a home directory; pass --vault-dir or set PASSVAULT_DIR".into(),
            )
        })
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

// ── Tests ────────────────────────────────────────────────────────────
