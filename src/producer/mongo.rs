use std::path::{Path, PathBuf};

use super::{Producer, esc, format_param, quoted};
use crate::config::JobConfig;
use crate::errors::Result;

const RESERVED: &[&str] = &["verbose", "archive", "out"];

/// `mongodump` into a scratch directory next to the output, then tarred and
/// gzipped into the output file. The same shape serves the MongoDB 5 and the
/// legacy MongoDB 4 tool; only the executable differs.
#[derive(Debug, Clone)]
pub struct MongoProducer {
    executable: String,
}

impl MongoProducer {
    pub fn new(executable: impl Into<String>) -> Self {
        MongoProducer {
            executable: executable.into(),
        }
    }
}

impl Producer for MongoProducer {
    fn build_command_line(&self, job: &JobConfig, output: &Path) -> Result<String> {
        let mut scratch = output.as_os_str().to_owned();
        scratch.push("_dump");
        let scratch = PathBuf::from(scratch);

        let mut parts = vec![
            format!("\"{}\"", esc(&self.executable)),
            "--verbose".to_string(),
            format!("--out={}", quoted(&scratch)),
        ];
        for (key, value) in &job.vars {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            parts.push(format_param(key, value));
        }
        parts.push(format!(
            "&& tar -cvzf {} --directory {} .",
            quoted(output),
            quoted(&scratch)
        ));
        parts.push(format!("&& rm --verbose --recursive --force {}", quoted(&scratch)));
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
            DumpType::Mongo,
            &[("db", "users"), ("host", "localhost"), ("out", "/elsewhere")],
        );
        let cmd = MongoProducer::new("mongodump").build_command_line(&job, Path::new("/tmp/users"))?;
        assert_eq!(
            cmd,
            "\"mongodump\" --verbose --out=\"/tmp/users_dump\" --db=\"users\" --host=\"localhost\" \
             && tar -cvzf \"/tmp/users\" --directory \"/tmp/users_dump\" . \
             && rm --verbose --recursive --force \"/tmp/users_dump\""
        );
        Ok(())
    }
}
