use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fingerprint::FrameFingerprint;
use crate::hash::HashService;
use crate::index::DuplicateIndex;

/// Duplicate verdict for one (file, prior candidate) pair. A file with no
/// verdicts is unique; one file can produce verdicts against several earlier
/// candidates in the same pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// The two files show the same footage but are not byte-identical.
    /// `score` is how many of this file's frames matched `owner`, clamped to
    /// the sample count; `total` is the smaller of the two sample counts.
    PerceptualDuplicateOf {
        owner: PathBuf,
        score: usize,
        total: usize,
    },
    /// Byte-identical copy, confirmed by size and content digest.
    ExactDuplicateOf { owner: PathBuf, digest: String },
}

impl Verdict {
    pub fn owner(&self) -> &Path {
        match self {
            Verdict::PerceptualDuplicateOf { owner, .. } => owner,
            Verdict::ExactDuplicateOf { owner, .. } => owner,
        }
    }
}

/// Turns one file's frame fingerprints into verdicts against everything
/// indexed so far, then leaves the file's own fingerprints behind in the
/// index for later files to match.
pub struct Classifier {
    hamming_threshold: u32,
    match_ratio: f64,
    verifier: HashService,
}

impl Classifier {
    pub fn new(hamming_threshold: u32, match_ratio: f64) -> Self {
        Self {
            hamming_threshold,
            match_ratio,
            verifier: HashService::new(),
        }
    }

    /// Classify `file` against the prior index state.
    ///
    /// Each frame is queried before it is inserted, so a file can never match
    /// itself: hits owned by `file` are discarded even when a later frame of
    /// the same file lands within range of an earlier one. The tally counts
    /// one hit per returned index entry, so a candidate with several
    /// near-identical indexed frames inside one query's radius is counted
    /// once per frame it contributed.
    pub fn classify(
        &self,
        file: &Path,
        frames: &[FrameFingerprint],
        index: &mut DuplicateIndex,
    ) -> Vec<Verdict> {
        index.register_owner(file);

        let mut tally: HashMap<PathBuf, usize> = HashMap::new();
        for frame in frames {
            for hit in index.query_approx(frame.fingerprint, self.hamming_threshold) {
                if hit.owner.as_path() != file {
                    *tally.entry(hit.owner).or_insert(0) += 1;
                }
            }
            index.insert(frame.fingerprint, frame.ordinal, file);
        }

        let sampled = frames.len();
        if sampled == 0 {
            return Vec::new();
        }

        // candidate order must not depend on HashMap iteration
        let mut candidates: Vec<(PathBuf, usize)> = tally.into_iter().collect();
        candidates.sort();

        let mut verdicts = Vec::new();
        for (owner, count) in candidates {
            let ratio = count as f64 / sampled as f64;
            if ratio < self.match_ratio {
                continue;
            }

            if count == sampled {
                match self.verifier.verify_identical_content(file, &owner) {
                    Ok(Some(digest)) => {
                        verdicts.push(Verdict::ExactDuplicateOf { owner, digest });
                        continue;
                    }
                    Ok(None) => {}
                    Err(err) => log::warn!(
                        "could not verify {} against {}: {err}",
                        file.display(),
                        owner.display()
                    ),
                }
            }

            let total = sampled.min(index.owner_frames(&owner));
            verdicts.push(Verdict::PerceptualDuplicateOf {
                score: count.min(sampled),
                total,
                owner,
            });
        }

        verdicts
    }
}
