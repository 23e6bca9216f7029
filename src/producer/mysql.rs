use std::path::Path;

use super::{Producer, esc, format_param, quoted, required_var};
use crate::config::JobConfig;
use crate::errors::Result;

const RESERVED: &[&str] = &["verbose", "help", "databases", "all-databases", "database"];

/// `mysqldump` of a single database, gzipped.
#[derive(Debug, Clone)]
pub struct MysqlProducer {
    executable: String,
}

impl MysqlProducer {
    pub fn new(executable: impl Into<String>) -> Self {
        MysqlProducer {
            executable: executable.into(),
        }
    }
}

impl Producer for MysqlProducer {
    fn build_command_line(&self, job: &JobConfig, output: &Path) -> Result<String> {
        let database = required_var(job, "database")?;

        let mut parts = vec![format!("\"{}\"", esc(&self.executable)), "--verbose".to_string()];
        for (key, value) in &job.vars {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            parts.push(format_param(key, value));
        }
        parts.push(format!("\"{}\"", esc(database)));
        parts.push(format!("| gzip > {}", quoted(output)));
        Ok(parts.join(" "))
    }
}
