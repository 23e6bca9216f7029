use std::path::Path;

use super::{Producer, esc, format_param, quoted};
use crate::config::JobConfig;
use crate::errors::Result;

const RESERVED: &[&str] = &["verbose", "format", "password"];

/// `pg_dump` in plain format, gzipped. Vars become long options
/// (`host`, `port`, `username`, `dbname`, `schema`, ...); `password` goes
/// through `PGPASSWORD`.
#[derive(Debug, Clone)]
pub struct PostgresProducer {
    executable: String,
}

impl PostgresProducer {
    pub fn new(executable: impl Into<String>) -> Self {
        PostgresProducer {
            executable: executable.into(),
        }
    }
}

impl Producer for PostgresProducer {
    fn build_command_line(&self, job: &JobConfig, output: &Path) -> Result<String> {
        let mut parts = Vec::new();

        if let Some(password) = job.vars.get("password") {
            parts.push(format!("PGPASSWORD=\"{}\"", esc(password)));
        }
        parts.push(format!("\"{}\"", esc(&self.executable)));
        parts.push("--verbose".to_string());
        parts.push("--format=plain".to_string());

        for (key, value) in &job.vars {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            parts.push(format_param(key, value));
        }

        parts.push(format!("| gzip > {}", quoted(output)));
        Ok(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DumpType;
    use crate::producer::test_support::job;

    #[test]
    fn test_command_line() -> anyhow::Result<()> {
        let job = job(
            DumpType::Postgres,
            &[
                ("dbname", "billing"),
                ("format", "custom"),
                ("host", "localhost"),
                ("password", "s3cr$t"),
                ("port", "5432"),
            ],
        );
        let cmd = PostgresProducer::new("pg_dump").build_command_line(&job, Path::new("/tmp/billing"))?;
        assert_eq!(
            cmd,
            "PGPASSWORD=\"s3cr\\$t\" \"pg_dump\" --verbose --format=plain \
             --dbname=\"billing\" --host=\"localhost\" --port=\"5432\" | gzip > \"/tmp/billing\""
        );
        Ok(())
    }

    #[test]
    fn test_without_password() -> anyhow::Result<()> {
        let job = job(DumpType::Postgres, &[("dbname", "app")]);
        let cmd = PostgresProducer::new("/usr/bin/pg_dump").build_command_line(&job, Path::new("/tmp/app"))?;
        assert!(cmd.starts_with("\"/usr/bin/pg_dump\" --verbose"));
        assert!(!cmd.contains("PGPASSWORD"));
        Ok(())
    }
}
