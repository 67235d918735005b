//! Path Layout Module
//!
//! Derives the on-disk location of a file-backend entry from its key.
//! The mapping is a pure function of the key and the layout, so every
//! instance configured the same way resolves a key to the same file.

use std::ops::Range;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::CacheError;

/// Length of a rendered key digest (SHA-256 as lowercase hex).
pub const DIGEST_HEX_LEN: usize = 64;

const FIRST_SEGMENT: Range<usize> = 0..3;
const SECOND_SEGMENT: Range<usize> = 4..7;

// == Shard Depth ==
/// Number of hash-derived directory levels between the root and an entry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShardDepth {
    /// Entries live directly under the root
    Flat,
    /// `<root>/<abc>/<digest><suffix>`
    One,
    /// `<root>/<abc>/<efg>/<digest><suffix>`
    #[default]
    Two,
}

impl ShardDepth {
    /// Number of directory levels this depth inserts.
    pub fn levels(self) -> usize {
        match self {
            ShardDepth::Flat => 0,
            ShardDepth::One => 1,
            ShardDepth::Two => 2,
        }
    }
}

impl TryFrom<u8> for ShardDepth {
    type Error = CacheError;

    fn try_from(depth: u8) -> Result<Self, Self::Error> {
        match depth {
            0 => Ok(ShardDepth::Flat),
            1 => Ok(ShardDepth::One),
            2 => Ok(ShardDepth::Two),
            other => Err(CacheError::InvalidConfig(format!(
                "shard depth must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// Hashes a key into its fixed-width hex digest.
pub fn key_digest(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

// == Path Layout ==
/// Root, suffix and shard depth of a file backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLayout {
    root: PathBuf,
    suffix: String,
    depth: ShardDepth,
}

impl PathLayout {
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>, depth: ShardDepth) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
            depth,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn depth(&self) -> ShardDepth {
        self.depth
    }

    /// Directory holding the entry with this digest. `digest` must come from
    /// [`key_digest`].
    fn shard_dir(&self, digest: &str) -> PathBuf {
        match self.depth {
            ShardDepth::Flat => self.root.clone(),
            ShardDepth::One => self.root.join(&digest[FIRST_SEGMENT]),
            ShardDepth::Two => self
                .root
                .join(&digest[FIRST_SEGMENT])
                .join(&digest[SECOND_SEGMENT]),
        }
    }

    /// Full path of the entry file for `key`. Touches nothing on disk.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = key_digest(key);
        self.shard_dir(&digest)
            .join(format!("{}{}", digest, self.suffix))
    }

    /// Whether `path` has the shape of an entry file under this layout:
    /// the right depth below the root and a `<digest><suffix>` name.
    pub fn is_entry_path(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.components().count() != self.depth.levels() + 1 {
            return false;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.strip_suffix(self.suffix.as_str())
            .is_some_and(|digest| {
                digest.len() == DIGEST_HEX_LEN
                    && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
            })
    }
}
