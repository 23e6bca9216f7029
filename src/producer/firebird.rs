use std::path::Path;

use super::{Producer, esc, quoted, required_var};
use crate::config::JobConfig;
use crate::errors::Result;

/// `gbak` backup of a Firebird 2.5 database. Vars: `db` (required),
/// `host`, `port`, `username`, `password`.
#[derive(Debug, Clone)]
pub struct FirebirdLegacyProducer {
    executable: String,
}

impl FirebirdLegacyProducer {
    pub fn new(executable: impl Into<String>) -> Self {
        FirebirdLegacyProducer {
            executable: executable.into(),
        }
    }
}

impl Producer for FirebirdLegacyProducer {
    fn build_command_line(&self, job: &JobConfig, output: &Path) -> Result<String> {
        let db = required_var(job, "db")?;

        let mut parts = vec![format!(
            "\"{}\" -VERIFY -BACKUP_DATABASE -GARBAGE_COLLECT",
            esc(&self.executable)
        )];
        if let Some(user) = job.vars.get("username") {
            parts.push(format!("-USER \"{}\"", esc(user)));
        }
        if let Some(password) = job.vars.get("password") {
            parts.push(format!("-PASSWORD \"{}\"", esc(password)));
        }

        let source = match (job.vars.get("host"), job.vars.get("port")) {
            (Some(host), Some(port)) => format!("{}/{}:{}", esc(host), esc(port), esc(db)),
            (Some(host), None) => format!("{}:{}", esc(host), esc(db)),
            _ => esc(db),
        };
        parts.push(format!("\"{}\"", source));
        parts.push(quoted(output));
        Ok(parts.join(" "))
    }
}
