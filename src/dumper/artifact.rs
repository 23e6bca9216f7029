use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOG_SUFFIX: &str = ".log";
pub const CHECKSUM_SUFFIX: &str = ".checksum";

/// The three co-located files of one dump: data blob, producer log and
/// checksum report, all sharing one base name in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    dir: PathBuf,
    base: String,
}

impl ArtifactSet {
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        ArtifactSet {
            dir: dir.into(),
            base: base.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn data(&self) -> PathBuf {
        self.dir.join(&self.base)
    }

    pub fn log(&self) -> PathBuf {
        self.dir.join(format!("{}{}", self.base, LOG_SUFFIX))
    }

    pub fn checksum(&self) -> PathBuf {
        self.dir.join(format!("{}{}", self.base, CHECKSUM_SUFFIX))
    }

    /// Data, log, checksum; the order promotion copies in.
    pub fn files(&self) -> [PathBuf; 3] {
        [self.data(), self.log(), self.checksum()]
    }

    /// Removes every file of the set, returning the ones that could not be
    /// removed. Files that are already gone count as removed.
    pub fn remove(&self) -> Vec<(PathBuf, std::io::Error)> {
        self.files()
            .into_iter()
            .filter_map(|path| match fs::remove_file(&path) {
                Ok(()) => None,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => Some((path, e)),
            })
            .collect()
    }
}

/// True for names that belong to a dump's siblings rather than the dump itself.
pub fn is_sibling_name(name: &str) -> bool {
    name.ends_with(LOG_SUFFIX) || name.ends_with(CHECKSUM_SUFFIX)
}

/// Hidden in-flight name used while a file is copied into a tier.
pub fn partial_name(target: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    if let Some(file_name) = target.file_name() {
        name.push(file_name);
    }
    name.push(".partial");
    target.with_file_name(name)
}
