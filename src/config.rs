use std::time::Duration;

/// Container extensions scanned when the user supplies no extra ones.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "wmv", "avi", "mp4", "mkv", "flv", "mpg", "mpeg", "mov", "webm", "m4v",
];

/// Knobs for one scan, built once from the CLI and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Frames sampled per video.
    pub frame_count: usize,
    /// Two fingerprints match when their Hamming distance is strictly below this.
    pub hamming_threshold: u32,
    /// Minimum fraction of a file's hashed frames that must match a candidate.
    pub match_ratio: f64,
    /// Seconds skipped before sampling starts, to get past title cards.
    pub skip_seconds: u64,
    /// Budget for one ffmpeg invocation.
    pub ffmpeg_timeout: Duration,
    /// Lowercase extension allow-list.
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            frame_count: 10,
            hamming_threshold: 16,
            match_ratio: 0.6,
            skip_seconds: 30,
            ffmpeg_timeout: Duration::from_secs(60),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ScanConfig {
    /// Add user-supplied extensions, normalized to lowercase without a leading dot.
    pub fn add_extensions<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extra {
            let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !self.extensions.contains(&ext) {
                self.extensions.push(ext);
            }
        }
    }
}
