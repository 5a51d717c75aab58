//! Find duplicate video files by the visual content of their frames.
//!
//! Files are processed one at a time: a handful of stills is sampled with
//! ffmpeg, each still is reduced to a 64-bit perceptual fingerprint, and the
//! fingerprints are classified against an append-only index of everything
//! seen earlier in the scan. Re-encoded or rescaled copies surface as
//! perceptual duplicates; byte-identical copies are confirmed with a content
//! digest and reported as exact.

pub mod classify;
pub mod config;
pub mod fingerprint;
pub mod frames;
pub mod hash;
pub mod index;
pub mod report;
pub mod scanner;

pub use classify::{Classifier, Verdict};
pub use config::ScanConfig;
pub use fingerprint::{Fingerprint, FrameFingerprint, FrameHasher};
pub use frames::{FrameError, FrameSampler, SampledFrame};
pub use hash::HashService;
pub use index::{DuplicateIndex, FrameRef};
pub use scanner::{list_video_files, ScanError};
