pub(crate) mod artifact;
pub(crate) mod checksum;
pub(crate) mod orchestrator;
pub(crate) mod period;
pub(crate) mod runner;

use chrono::NaiveDate;
use tracing::{error, info};

use crate::config::{GlobalConfig, JobConfig};
use crate::producer;

use orchestrator::{JobOutcome, Orchestrator};

/// Picks the job's producer and wires up its orchestrator for `run_date`.
/// A producer that cannot be built is already the job's final outcome.
pub fn prepare_job(
    global: &GlobalConfig,
    job: JobConfig,
    run_date: NaiveDate,
) -> std::result::Result<Orchestrator, JobOutcome> {
    match producer::for_job(global, &job) {
        Ok(producer) => Ok(Orchestrator::new(job, producer, &global.sh_executable).at(run_date)),
        Err(e) => {
            error!(job = %job.name, dump_type = %job.dump_type, error = %e, retriable = e.is_retriable(), "unable to create dumper");
            Err(JobOutcome::from(&e))
        }
    }
}

/// Runs a prepared job and collapses the result into a single outcome.
pub fn run_job(orchestrator: Orchestrator) -> JobOutcome {
    let name = orchestrator.job_name().to_string();

    let outcome = match orchestrator.run() {
        Ok(report) => report.outcome(),
        Err(e) => {
            error!(job = %name, error = %e, retriable = e.is_retriable(), "run aborted");
            JobOutcome::from(&e)
        }
    };

    if outcome.success {
        info!(job = %name, message = %outcome.message, "dump finished");
    } else {
        error!(job = %name, message = %outcome.message, "dump error");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DumpType, TierSetting};
    use std::collections::BTreeMap;

    fn tar_job(vars: &[(&str, &str)], root: &std::path::Path, staging: &std::path::Path) -> JobConfig {
        let off = TierSetting { enabled: false, keep: -1 };
        JobConfig {
            dump_type: DumpType::Tar,
            name: "uploads".to_string(),
            root_path: root.to_path_buf(),
            staging_path: staging.to_path_buf(),
            vars: vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<BTreeMap<_, _>>(),
            force_latest: false,
            daily: off,
            weekly: off,
            monthly: off,
            timeout: None,
        }
    }

    #[test]
    fn test_unbuildable_producer_is_a_failed_outcome() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let job = tar_job(&[], &tmp.path().join("root"), &tmp.path().join("tmp"));
        let run_date = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();

        let outcome = match prepare_job(&GlobalConfig::default(), job, run_date) {
            Ok(_) => panic!("a tar job without a path must not be prepared"),
            Err(outcome) => outcome,
        };
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Configuration error"));
        assert!(!tmp.path().join("root").exists());
        assert!(!tmp.path().join("tmp").exists());
        Ok(())
    }

    #[test]
    fn test_failing_producer_is_a_failed_outcome() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let job = tar_job(&[("path", "/srv/uploads")], &tmp.path().join("root"), &tmp.path().join("tmp"));
        let global = GlobalConfig {
            tar_executable: "false".to_string(),
            ..GlobalConfig::default()
        };
        let run_date = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();

        let Ok(orchestrator) = prepare_job(&global, job, run_date) else {
            panic!("tar job with a path must be prepared");
        };
        let outcome = run_job(orchestrator);
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Execution failed"), "{}", outcome.message);
        assert!(!tmp.path().join("root").join("latest").exists());
        Ok(())
    }
}
