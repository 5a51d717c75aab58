use chrono::Utc;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classify::Verdict;

/// One line of the machine-readable report: everything the scan learned
/// about a single file.
#[derive(Debug, Serialize)]
pub struct FileRecord {
    pub timestamp: String,
    pub file: PathBuf,
    pub size_bytes: u64,
    pub frames_hashed: usize,
    pub verdicts: Vec<Verdict>,
}

impl FileRecord {
    pub fn new(file: PathBuf, size_bytes: u64, frames_hashed: usize, verdicts: Vec<Verdict>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            file,
            size_bytes,
            frames_hashed,
            verdicts,
        }
    }
}

/// Appends one JSON record per scanned file, newline-delimited.
pub struct JsonlReporter {
    out: File,
}

impl JsonlReporter {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let out = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { out })
    }

    pub fn append(&mut self, record: &FileRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.out, "{line}")
    }
}

pub fn print_file_line(path: &Path, size_bytes: u64, frames_hashed: usize) {
    println!(
        "▶ {:>10}  {}  ({} frames)",
        size_bytes,
        path.display(),
        frames_hashed
    );
}

pub fn print_verdict(verdict: &Verdict) {
    match verdict {
        Verdict::PerceptualDuplicateOf {
            owner,
            score,
            total,
        } => {
            println!(
                "   ✨ perceptual duplicate of {} (score {}/{})",
                owner.display(),
                score,
                total
            );
        }
        Verdict::ExactDuplicateOf { owner, digest } => {
            println!(
                "   ✨ exact duplicate of {} [{}]",
                owner.display(),
                &digest[..16.min(digest.len())]
            );
        }
    }
}

pub fn print_summary(scanned: usize, duplicate_files: usize, verdicts: usize, elapsed: Duration) {
    if verdicts == 0 {
        println!("\n✅ Scanned {scanned} video(s) in {elapsed:.2?}; no duplicates found.");
    } else {
        println!(
            "\n✅ Scanned {scanned} video(s) in {elapsed:.2?}; {duplicate_files} file(s) duplicated earlier ones ({verdicts} verdict(s))."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn records_serialize_with_tagged_verdicts() {
        let record = FileRecord::new(
            PathBuf::from("/v/two.mp4"),
            1024,
            3,
            vec![
                Verdict::PerceptualDuplicateOf {
                    owner: PathBuf::from("/v/one.mp4"),
                    score: 2,
                    total: 3,
                },
                Verdict::ExactDuplicateOf {
                    owner: PathBuf::from("/v/zero.mp4"),
                    digest: "abc123".into(),
                },
            ],
        );

        let value: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["file"], "/v/two.mp4");
        assert_eq!(value["size_bytes"], 1024);
        assert_eq!(value["frames_hashed"], 3);
        assert_eq!(value["verdicts"][0]["kind"], "perceptual_duplicate_of");
        assert_eq!(value["verdicts"][0]["score"], 2);
        assert_eq!(value["verdicts"][1]["kind"], "exact_duplicate_of");
        assert_eq!(value["verdicts"][1]["digest"], "abc123");
    }

    #[test]
    fn reporter_appends_one_line_per_record() {
        let temp_dir = TempDir::new().unwrap();
        let report_path = temp_dir.path().join("report.jsonl");

        let mut reporter = JsonlReporter::create(&report_path).unwrap();
        for i in 0..3u64 {
            let record = FileRecord::new(PathBuf::from(format!("/v/{i}.mp4")), i, 0, Vec::new());
            reporter.append(&record).unwrap();
        }
        drop(reporter);

        let contents = fs::read_to_string(&report_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["timestamp"].is_string());
        }
    }
}
