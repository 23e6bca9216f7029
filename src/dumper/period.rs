// dumpbox/src/dumper/period.rs
use chrono::{Datelike, NaiveDate};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::artifact::{self, ArtifactSet};
use crate::errors::{DumpError, Result};
use crate::utils::ensure_directory_exists;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Latest,
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub const PERIODIC: [Period; 3] = [Period::Daily, Period::Weekly, Period::Monthly];

    pub fn name(&self) -> &'static str {
        match self {
            Period::Latest => "latest",
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }

    /// Stable key of the period `date` falls into. Keys of one period sort
    /// lexicographically in chronological order.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Period::Latest => "latest".to_string(),
            Period::Daily => date.format("%Y-%m-%d").to_string(),
            // ISO week-year, not the calendar year: 2023-01-01 is in 2022-52.
            Period::Weekly => {
                let week = date.iso_week();
                format!("{:04}-{:02}", week.year(), week.week())
            }
            Period::Monthly => date.format("%Y-%m").to_string(),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    Promoted,
    Skipped,
}

/// One retention bucket of a job. Holds no state of its own beyond where it
/// lives and how much it keeps; everything else is read from disk.
#[derive(Debug, Clone)]
pub struct RetentionTier {
    job: String,
    period: Period,
    root: PathBuf,
    keep: i32,
}

impl RetentionTier {
    /// The always-current copy, kept directly in the job root.
    pub fn latest(job: impl Into<String>, job_root: &Path) -> Self {
        RetentionTier {
            job: job.into(),
            period: Period::Latest,
            root: job_root.to_path_buf(),
            keep: -1,
        }
    }

    pub fn periodic(job: impl Into<String>, period: Period, job_root: &Path, keep: i32) -> Self {
        RetentionTier {
            job: job.into(),
            period,
            root: job_root.join(period.name()),
            keep,
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    #[cfg(test)]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn overwrites(&self) -> bool {
        self.period == Period::Latest
    }

    pub fn entry(&self, key: &str) -> ArtifactSet {
        ArtifactSet::new(&self.root, key)
    }

    pub fn exists(&self, key: &str) -> bool {
        fs::metadata(self.entry(key).data()).is_ok_and(|meta| meta.is_file())
    }

    /// Copies the staged set into this tier under `key`.
    ///
    /// Each file lands under a hidden temporary name first and is renamed into
    /// place once all three copies succeeded. A rename failure part way leaves
    /// the tier's entry for `key` incomplete; the error names the file.
    pub fn promote(&self, staged: &ArtifactSet, key: &str) -> Result<Promotion> {
        if !self.overwrites() && self.exists(key) {
            info!(job = %self.job, tier = %self.period, period = key, "already exists, skipping");
            return Ok(Promotion::Skipped);
        }

        ensure_directory_exists(&self.root).map_err(|source| self.promotion_failed(&self.root, source))?;

        let target = self.entry(key);
        let mut staged_copies: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(3);
        for (source_file, target_file) in staged.files().into_iter().zip(target.files()) {
            let partial = artifact::partial_name(&target_file);
            if let Err(e) = fs::copy(&source_file, &partial) {
                discard_partials(staged_copies.iter().map(|(p, _)| p.as_path()).chain([partial.as_path()]));
                return Err(self.promotion_failed(&target_file, e));
            }
            staged_copies.push((partial, target_file));
        }

        for (index, (partial, target_file)) in staged_copies.iter().enumerate() {
            if let Err(e) = fs::rename(partial, target_file) {
                discard_partials(staged_copies[index..].iter().map(|(p, _)| p.as_path()));
                return Err(self.promotion_failed(target_file, e));
            }
        }

        info!(job = %self.job, tier = %self.period, period = key, "done");
        Ok(Promotion::Promoted)
    }

    /// Prunes the oldest entries beyond the retention bound. Keeps going past
    /// individual deletion failures and returns them.
    pub fn rotate(&self) -> Vec<DumpError> {
        if self.keep < 0 {
            return Vec::new();
        }

        let mut keys = match self.list_keys() {
            Ok(keys) => keys,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(job = %self.job, tier = %self.period, error = %e, "unable to list tier");
                return vec![self.rotation_failed(&self.root, e)];
            }
        };
        keys.sort();

        let excess = keys.len().saturating_sub(self.keep as usize);
        let mut failures = Vec::new();
        for key in &keys[..excess] {
            let entry = self.entry(key);
            for path in entry.files() {
                match fs::remove_file(&path) {
                    Ok(()) => debug!(job = %self.job, tier = %self.period, file = %path.display(), "deleted"),
                    // A missing sibling is not worth reporting; the data file is.
                    Err(e) if e.kind() == io::ErrorKind::NotFound && path != entry.data() => {}
                    Err(e) => {
                        warn!(job = %self.job, tier = %self.period, file = %path.display(), error = %e, "unable to delete");
                        failures.push(self.rotation_failed(&path, e));
                    }
                }
            }
            info!(job = %self.job, tier = %self.period, period = %key, "rotated out");
        }
        failures
    }

    /// Data-file names in the tier: regular, non-hidden files that are not a
    /// `.log` or `.checksum` sibling.
    fn list_keys(&self) -> io::Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.starts_with('.') || artifact::is_sibling_name(&name) {
                continue;
            }
            keys.push(name);
        }
        Ok(keys)
    }

    fn promotion_failed(&self, file: &Path, source: io::Error) -> DumpError {
        DumpError::PromotionFailed {
            tier: self.period.name().to_string(),
            file: file.to_path_buf(),
            source,
        }
    }

    fn rotation_failed(&self, file: &Path, source: io::Error) -> DumpError {
        DumpError::RotationFailed {
            tier: self.period.name().to_string(),
            file: file.to_path_buf(),
            source,
        }
    }
}

fn discard_partials<'a>(paths: impl IntoIterator<Item = &'a Path>) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}
