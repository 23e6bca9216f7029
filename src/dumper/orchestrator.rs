// dumpbox/src/dumper/orchestrator.rs
use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use super::artifact::ArtifactSet;
use super::checksum::ChecksumReport;
use super::period::{Period, Promotion, RetentionTier};
use super::runner::CommandRunner;
use crate::config::JobConfig;
use crate::errors::{DumpError, Result};
use crate::producer::Producer;
use crate::utils::{ensure_directory_exists, format_file_size};

/// What one job run amounts to, for the log and the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub success: bool,
    pub message: String,
}

impl JobOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        JobOutcome {
            success: false,
            message: message.into(),
        }
    }
}

impl From<&DumpError> for JobOutcome {
    fn from(err: &DumpError) -> Self {
        JobOutcome::failed(err.to_string())
    }
}

/// Everything a run did that did not abort it.
#[derive(Debug, Default)]
pub struct RunReport {
    pub executed: bool,
    pub dump_size: Option<u64>,
    pub promoted: Vec<Period>,
    pub skipped: Vec<Period>,
    pub promotion_failures: Vec<DumpError>,
    pub rotation_failures: Vec<DumpError>,
    pub cleanup_failures: Vec<String>,
}

impl RunReport {
    /// A run with a failed periodic promotion is a failure even though
    /// `latest` was refreshed; that tier's entry for the period is suspect.
    pub fn outcome(&self) -> JobOutcome {
        let mut message = if self.executed {
            match self.dump_size {
                Some(size) => format!("dump done ({})", format_file_size(size)),
                None => "dump done".to_string(),
            }
        } else {
            "dump not needed, all periods already present".to_string()
        };

        if !self.promotion_failures.is_empty() {
            let details: Vec<String> = self.promotion_failures.iter().map(|e| e.to_string()).collect();
            message.push_str(&format!("; promotion failed: {}", details.join("; ")));
        }
        let warnings = self.rotation_failures.len() + self.cleanup_failures.len();
        if warnings > 0 {
            message.push_str(&format!("; {} cleanup warning(s), see log", warnings));
        }

        JobOutcome {
            success: self.promotion_failures.is_empty(),
            message,
        }
    }
}

/// Runs one job: decide, execute, checksum, promote, rotate, clean up.
pub struct Orchestrator {
    job: JobConfig,
    producer: Box<dyn Producer>,
    runner: CommandRunner,
    run_date: NaiveDate,
}

impl Orchestrator {
    pub fn new(job: JobConfig, producer: Box<dyn Producer>, shell: &str) -> Self {
        let runner = CommandRunner::new(shell, job.timeout);
        Orchestrator {
            job,
            producer,
            runner,
            run_date: Local::now().date_naive(),
        }
    }

    /// Pins the date the run's period keys are derived from.
    pub fn at(mut self, run_date: NaiveDate) -> Self {
        self.run_date = run_date;
        self
    }

    pub fn job_name(&self) -> &str {
        &self.job.name
    }

    pub fn run(&self) -> Result<RunReport> {
        self.validate()?;

        let name = self.job.name.as_str();
        let latest = RetentionTier::latest(name, &self.job.root_path);
        let periodic = self.periodic_tiers();
        let mut report = RunReport::default();

        if self.needs_dump(&periodic) {
            let staged = ArtifactSet::new(&self.job.staging_path, name);
            report.dump_size = Some(self.execute(&staged)?);
            report.executed = true;

            latest.promote(&staged, &Period::Latest.key(self.run_date))?;
            report.promoted.push(Period::Latest);

            for (tier, key) in &periodic {
                match tier.promote(&staged, key) {
                    Ok(Promotion::Promoted) => report.promoted.push(tier.period()),
                    Ok(Promotion::Skipped) => report.skipped.push(tier.period()),
                    Err(e) => {
                        error!(job = name, tier = %tier.period(), error = %e, "promotion failed");
                        report.promotion_failures.push(e);
                    }
                }
            }
        } else {
            info!(job = name, "all enabled periods already dumped, skipping producer");
        }

        for (tier, _) in &periodic {
            report.rotation_failures.extend(tier.rotate());
        }

        if report.executed {
            let staged = ArtifactSet::new(&self.job.staging_path, name);
            for (path, e) in staged.remove() {
                warn!(job = name, file = %path.display(), error = %e, "unable to remove staged file");
                report.cleanup_failures.push(format!("{}: {}", path.display(), e));
            }
        }

        Ok(report)
    }

    fn validate(&self) -> Result<()> {
        if self.job.name.trim().is_empty() {
            return Err(DumpError::config("dumper name not defined"));
        }
        if self.job.root_path.as_os_str().is_empty() {
            return Err(DumpError::config(format!("{}: dump path not defined", self.job.name)));
        }
        if self.job.staging_path.as_os_str().is_empty() {
            return Err(DumpError::config(format!("{}: tmp path not defined", self.job.name)));
        }
        Ok(())
    }

    fn periodic_tiers(&self) -> Vec<(RetentionTier, String)> {
        Period::PERIODIC
            .into_iter()
            .filter_map(|period| {
                let setting = match period {
                    Period::Daily => self.job.daily,
                    Period::Weekly => self.job.weekly,
                    Period::Monthly => self.job.monthly,
                    Period::Latest => return None,
                };
                setting.enabled.then(|| {
                    (
                        RetentionTier::periodic(&self.job.name, period, &self.job.root_path, setting.keep),
                        period.key(self.run_date),
                    )
                })
            })
            .collect()
    }

    /// A job without periodic tiers has nothing to compare against and always runs.
    fn needs_dump(&self, periodic: &[(RetentionTier, String)]) -> bool {
        self.job.force_latest
            || periodic.is_empty()
            || periodic.iter().any(|(tier, key)| !tier.exists(key))
    }

    fn execute(&self, staged: &ArtifactSet) -> Result<u64> {
        let command_line = self.producer.build_command_line(&self.job, &staged.data())?;
        ensure_directory_exists(staged.dir()).map_err(|e| {
            DumpError::execution_io(format!("unable to prepare tmp path {}", staged.dir().display()), e)
        })?;
        info!(job = %self.job.name, dump_type = %self.job.dump_type, "running producer");
        let size = self.runner.run(&command_line, &staged.log(), &staged.data())?;
        info!(job = %self.job.name, size = %format_file_size(size), "producer finished");

        ChecksumReport::compute(&staged.data())?.write_to(&staged.checksum())?;
        Ok(size)
    }
}
