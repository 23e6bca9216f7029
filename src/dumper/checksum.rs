// dumpbox/src/dumper/checksum.rs
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::Path;

use crate::errors::{DumpError, Result};

const BUFFER_SIZE: usize = 64 * 1024;

/// Digests of one staged dump file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumReport {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

impl ChecksumReport {
    /// Reads `path` once per digest and collects the hex values.
    pub fn compute(path: &Path) -> Result<Self> {
        let failed = |source: io::Error| DumpError::ChecksumFailed {
            path: path.to_path_buf(),
            source,
        };

        Ok(ChecksumReport {
            md5: file_digest::<Md5>(path).map_err(failed)?,
            sha1: file_digest::<Sha1>(path).map_err(failed)?,
            sha256: file_digest::<Sha256>(path).map_err(failed)?,
        })
    }

    pub fn render(&self) -> String {
        format!(
            "MD5: {}\nSHA1: {}\nSHA256: {}\n",
            self.md5, self.sha1, self.sha256
        )
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|source| DumpError::ChecksumFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn file_digest<D: Digest + io::Write>(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = io::BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = D::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("dump");
        fs::write(&path, b"hello")?;

        let report = ChecksumReport::compute(&path)?;
        assert_eq!(report.md5, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(report.sha1, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
        assert_eq!(
            report.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        Ok(())
    }

    #[test]
    fn test_report_format() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("empty");
        fs::write(&path, b"")?;

        let report = ChecksumReport::compute(&path)?;
        assert_eq!(
            report.render(),
            "MD5: d41d8cd98f00b204e9800998ecf8427e\n\
             SHA1: da39a3ee5e6b4b0d3255bfef95601890afd80709\n\
             SHA256: e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n"
        );
        Ok(())
    }

    #[test]
    fn test_report_is_reproducible() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&first, &content)?;
        fs::write(&second, &content)?;

        let a = tmp.path().join("a.checksum");
        let b = tmp.path().join("b.checksum");
        ChecksumReport::compute(&first)?.write_to(&a)?;
        ChecksumReport::compute(&second)?.write_to(&b)?;
        assert_eq!(fs::read(&a)?, fs::read(&b)?);
        Ok(())
    }

    #[test]
    fn test_unreadable_file() {
        let err = ChecksumReport::compute(Path::new("/nonexistent/dump")).unwrap_err();
        assert!(matches!(err, DumpError::ChecksumFailed { .. }));
    }
}
