use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fingerprint::Fingerprint;

/// Location of one indexed frame: its sample position and owning file.
/// Ordinals restart at zero for every file, so only the pair is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef {
    pub ordinal: usize,
    pub owner: PathBuf,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    fingerprint: Fingerprint,
    ordinal: usize,
    owner: PathBuf,
}

/// Append-only multimap from fingerprint to the frames that produced it,
/// accumulated across every file processed so far. Entries are never removed
/// or overwritten; duplicate fingerprints from different frames all stay.
///
/// Queries are a linear scan in insertion order, which keeps results
/// deterministic and is plenty for collections that fit in memory.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    entries: Vec<IndexEntry>,
    owner_frames: HashMap<PathBuf, usize>,
}

impl DuplicateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an owner even when it contributes no entries, so files with no
    /// usable frames still count as indexed.
    pub fn register_owner(&mut self, owner: &Path) {
        self.owner_frames.entry(owner.to_path_buf()).or_insert(0);
    }

    /// Append one entry. Always succeeds; nothing is deduplicated.
    pub fn insert(&mut self, fingerprint: Fingerprint, ordinal: usize, owner: &Path) {
        *self.owner_frames.entry(owner.to_path_buf()).or_insert(0) += 1;
        self.entries.push(IndexEntry {
            fingerprint,
            ordinal,
            owner: owner.to_path_buf(),
        });
    }

    /// Every indexed frame whose fingerprint lies strictly closer than
    /// `max_distance` to the query, in insertion order.
    pub fn query_approx(&self, fingerprint: Fingerprint, max_distance: u32) -> Vec<FrameRef> {
        self.entries
            .iter()
            .filter(|entry| entry.fingerprint.distance(fingerprint) < max_distance)
            .map(|entry| FrameRef {
                ordinal: entry.ordinal,
                owner: entry.owner.clone(),
            })
            .collect()
    }

    /// Number of successfully hashed frames indexed for `owner`.
    pub fn owner_frames(&self, owner: &Path) -> usize {
        self.owner_frames.get(owner).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
