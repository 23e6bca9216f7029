//! Command builders: turn a job's vars into the shell command line that
//! writes its dump to a given output file.

mod firebird;
mod mongo;
mod mysql;
mod postgres;
mod tar;

use std::path::Path;

use crate::config::{DumpType, GlobalConfig, JobConfig};
use crate::errors::{DumpError, Result};

pub use firebird::FirebirdLegacyProducer;
pub use mongo::MongoProducer;
pub use mysql::MysqlProducer;
pub use postgres::PostgresProducer;
pub use tar::TarProducer;

pub trait Producer: Send + Sync {
    /// Shell command line that writes the job's dump to `output`.
    fn build_command_line(&self, job: &JobConfig, output: &Path) -> Result<String>;
}

/// Picks the producer for the job's dump type, wired to the configured executable.
pub fn for_job(global: &GlobalConfig, job: &JobConfig) -> Result<Box<dyn Producer>> {
    let producer: Box<dyn Producer> = match job.dump_type {
        DumpType::Postgres => Box::new(PostgresProducer::new(executable(
            &global.pgdump_executable,
            "pg_dump",
        )?)),
        DumpType::Mysql => Box::new(MysqlProducer::new(executable(
            &global.mysqldump_executable,
            "mysqldump",
        )?)),
        DumpType::Mongo => Box::new(MongoProducer::new(executable(
            &global.mongodump5_executable,
            "mongodump",
        )?)),
        DumpType::MongoLegacy => Box::new(MongoProducer::new(executable(
            &global.mongodump4_executable,
            "legacy mongodump",
        )?)),
        DumpType::FirebirdLegacy => Box::new(FirebirdLegacyProducer::new(executable(
            &global.gbak_executable,
            "gbak",
        )?)),
        DumpType::Tar => Box::new(TarProducer::new(executable(&global.tar_executable, "tar")?)),
    };
    Ok(producer)
}

fn executable(path: &str, what: &str) -> Result<String> {
    if path.trim().is_empty() {
        return Err(DumpError::config(format!("{} executable not defined", what)));
    }
    Ok(path.to_string())
}

/// Escapes a value for use inside a double-quoted shell word.
pub(crate) fn esc(param: &str) -> String {
    param
        .replace('$', "\\$")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// `--key="value"`, or a bare `--key` flag when the value is empty.
pub(crate) fn format_param(key: &str, value: &str) -> String {
    if value.is_empty() {
        format!("--{}", key)
    } else {
        format!("--{}=\"{}\"", key, esc(value))
    }
}

pub(crate) fn quoted(path: &Path) -> String {
    format!("\"{}\"", esc(&path.to_string_lossy()))
}

pub(crate) fn required_var<'a>(job: &'a JobConfig, key: &str) -> Result<&'a str> {
    match job.vars.get(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(DumpError::config(format!(
            "{} ({}): var '{}' is required",
            job.name, job.dump_type, key
        ))),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::{DumpType, JobConfig, TierSetting};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    pub fn job(dump_type: DumpType, vars: &[(&str, &str)]) -> JobConfig {
        let off = TierSetting { enabled: false, keep: -1 };
        JobConfig {
            dump_type,
            name: "job".to_string(),
            root_path: PathBuf::from("/dumps/job"),
            staging_path: PathBuf::from("/tmp"),
            vars: vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            force_latest: false,
            daily: off,
            weekly: off,
            monthly: off,
            timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_esc() {
        assert_eq!(esc("pa$$word"), "pa\\$\\$word");
        assert_eq!(esc("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(esc("a\nb"), "a\\nb");
        assert_eq!(esc("plain"), "plain");
    }

    #[test]
    fn test_format_param() {
        assert_eq!(format_param("host", "db"), "--host=\"db\"");
        assert_eq!(format_param("single-transaction", ""), "--single-transaction");
    }

    #[test]
    fn test_for_job_rejects_empty_executable() {
        let global = GlobalConfig {
            tar_executable: String::new(),
            ..GlobalConfig::default()
        };
        let job = test_support::job(DumpType::Tar, &[("path", "/srv")]);
        let err = for_job(&global, &job).err().unwrap();
        assert!(matches!(err, DumpError::ConfigInvalid(_)));
    }

    #[test]
    fn test_for_job_picks_mongo_executable_by_version() -> anyhow::Result<()> {
        let global = GlobalConfig::default();
        let output = Path::new("/tmp/job");

        let modern = for_job(&global, &test_support::job(DumpType::Mongo, &[]))?
            .build_command_line(&test_support::job(DumpType::Mongo, &[]), output)?;
        assert!(modern.starts_with("\"/mongodb5/bin/mongodump\""));

        let legacy = for_job(&global, &test_support::job(DumpType::MongoLegacy, &[]))?
            .build_command_line(&test_support::job(DumpType::MongoLegacy, &[]), output)?;
        assert!(legacy.starts_with("\"/mongodb4/bin/mongodump\""));
        Ok(())
    }
}
