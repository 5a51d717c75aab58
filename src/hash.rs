use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whole-file identity oracle: size plus a strong content digest. Only
/// consulted once perceptual matching already says two files look identical.
pub struct HashService;

impl HashService {
    pub fn new() -> Self {
        Self
    }

    /// Compute the blake3 digest of a file as a hex string.
    pub fn content_digest(&self, file_path: &Path) -> Result<String, HashError> {
        let file = File::open(file_path)?;
        let mut reader = BufReader::new(file);
        let mut hasher = blake3::Hasher::new();
        let mut buffer = [0; 8192];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize().to_hex().to_string())
    }

    pub fn file_size(&self, file_path: &Path) -> Result<u64, HashError> {
        Ok(std::fs::metadata(file_path)?.len())
    }

    /// Returns the shared digest when both files hold identical bytes, and
    /// `None` otherwise. Differing sizes short-circuit before any hashing.
    pub fn verify_identical_content(
        &self,
        file1: &Path,
        file2: &Path,
    ) -> Result<Option<String>, HashError> {
        if self.file_size(file1)? != self.file_size(file2)? {
            return Ok(None);
        }
        let digest1 = self.content_digest(file1)?;
        let digest2 = self.content_digest(file2)?;
        Ok((digest1 == digest2).then_some(digest1))
    }
}

impl Default for HashService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn digest_is_stable_hex() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.bin");
        fs::write(&file_path, b"Hello, World!").unwrap();

        let hash_service = HashService::new();
        let digest = hash_service.content_digest(&file_path).unwrap();
        let again = hash_service.content_digest(&file_path).unwrap();
        assert_eq!(digest, again);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn identical_files_verify() {
        let temp_dir = TempDir::new().unwrap();
        let file1 = temp_dir.path().join("file1.bin");
        let file2 = temp_dir.path().join("file2.bin");
        fs::write(&file1, b"Identical content").unwrap();
        fs::write(&file2, b"Identical content").unwrap();

        let hash_service = HashService::new();
        let digest = hash_service
            .verify_identical_content(&file1, &file2)
            .unwrap()
            .expect("identical files should verify");
        assert_eq!(digest, hash_service.content_digest(&file1).unwrap());
    }

    #[test]
    fn same_size_different_bytes_fail_verification() {
        let temp_dir = TempDir::new().unwrap();
        let file1 = temp_dir.path().join("file1.bin");
        let file2 = temp_dir.path().join("file2.bin");
        fs::write(&file1, b"Content A").unwrap();
        fs::write(&file2, b"Content B").unwrap();

        let hash_service = HashService::new();
        assert!(hash_service
            .verify_identical_content(&file1, &file2)
            .unwrap()
            .is_none());
    }

    #[test]
    fn size_mismatch_short_circuits() {
        let temp_dir = TempDir::new().unwrap();
        let file1 = temp_dir.path().join("file1.bin");
        let file2 = temp_dir.path().join("file2.bin");
        fs::write(&file1, b"short").unwrap();
        fs::write(&file2, b"rather longer content").unwrap();

        let hash_service = HashService::new();
        assert!(hash_service
            .verify_identical_content(&file1, &file2)
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.bin");
        let hash_service = HashService::new();
        assert!(matches!(
            hash_service.content_digest(&missing),
            Err(HashError::Io(_))
        ));
    }
}
