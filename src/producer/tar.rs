use std::path::Path;

use super::{Producer, esc, format_param, quoted, required_var};
use crate::config::JobConfig;
use crate::errors::{DumpError, Result};

const RESERVED: &[&str] = &["path", "compress", "verbose", "create", "directory"];
const SEPARATOR: char = '/';

/// Archives a file or directory with `tar`. Vars: `path` (required) and
/// `compress` (`none`, `bzip2`, `gzip`, `lzma`, `xz`).
#[derive(Debug, Clone)]
pub struct TarProducer {
    executable: String,
}

impl TarProducer {
    pub fn new(executable: impl Into<String>) -> Self {
        TarProducer {
            executable: executable.into(),
        }
    }
}

impl Producer for TarProducer {
    fn build_command_line(&self, job: &JobConfig, output: &Path) -> Result<String> {
        let path = required_var(job, "path")?;

        let mut parts = vec![
            format!("\"{}\"", esc(&self.executable)),
            "--verbose".to_string(),
            "--create".to_string(),
        ];

        match job.vars.get("compress").map(String::as_str).unwrap_or("none") {
            "" | "none" => {}
            "bzip2" => parts.push("--bzip2".to_string()),
            "gzip" => parts.push("--gzip".to_string()),
            "lzma" => parts.push("--lzma".to_string()),
            "xz" => parts.push("--xz".to_string()),
            other => {
                return Err(DumpError::config(format!(
                    "{} (tar): unknown compression '{}'",
                    job.name, other
                )));
            }
        }

        let (directory, target) = split_target_path(path);
        if target.is_empty() {
            return Err(DumpError::config(format!("{} (tar): empty path target name", job.name)));
        }

        parts.push(format!("--file {}", quoted(output)));
        if !directory.is_empty() {
            parts.push(format!("--directory \"{}\"", esc(directory)));
        }
        for (key, value) in &job.vars {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            parts.push(format_param(key, value));
        }
        parts.push(format!("\"{}\"", esc(target)));
        Ok(parts.join(" "))
    }
}

/// Splits a path into the directory tar should change into and the entry to
/// archive. Trailing separators are ignored; a root-level entry keeps `/` as
/// its directory.
fn split_target_path(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(index) => {
            let directory = &trimmed[..index];
            if directory.is_empty() {
                (&path[..1], &trimmed[index + 1..])
            } else {
                (directory, &trimmed[index + 1..])
            }
        }
        None => ("", trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DumpType;
    use crate::producer::test_support::job;

    #[test]
    fn test_split_target_path() {
        let cases = [
            ("normal", "/directory1/directory2/file", "/directory1/directory2", "file"),
            ("ends with slash", "/d1/d2/", "/d1", "d2"),
            ("double slash", "/d1//d2/d3", "/d1//d2", "d3"),
            ("at root", "/root", "/", "root"),
            ("ends with double slash", "/d1/d2//", "/d1", "d2"),
            ("relative path", "d1/d2/d3", "d1/d2", "d3"),
            ("relative single", "dir", "", "dir"),
        ];
        for (name, path, directory, target) in cases {
            assert_eq!(split_target_path(path), (directory, target), "case: {}", name);
        }
    }

    #[test]
    fn test_command_line() -> anyhow::Result<()> {
        let job = job(
            DumpType::Tar,
            &[
                ("compress", "xz"),
                ("exclude", "*.tmp"),
                ("path", "/var/www/uploads/"),
            ],
        );
        let cmd = TarProducer::new("tar").build_command_line(&job, Path::new("/tmp/uploads"))?;
        assert_eq!(
            cmd,
            "\"tar\" --verbose --create --xz --file \"/tmp/uploads\" --directory \"/var/www\" \
             --exclude=\"*.tmp\" \"uploads\""
        );
        Ok(())
    }

    #[test]
    fn test_relative_single_has_no_directory() -> anyhow::Result<()> {
        let job = job(DumpType::Tar, &[("path", "data")]);
        let cmd = TarProducer::new("tar").build_command_line(&job, Path::new("/tmp/data"))?;
        assert_eq!(cmd, "\"tar\" --verbose --create --file \"/tmp/data\" \"data\"");
        Ok(())
    }

    #[test]
    fn test_unknown_compression() {
        let job = job(DumpType::Tar, &[("compress", "zip"), ("path", "/srv")]);
        let err = TarProducer::new("tar")
            .build_command_line(&job, Path::new("/tmp/srv"))
            .unwrap_err();
        assert!(matches!(err, DumpError::ConfigInvalid(_)));
    }

    #[test]
    fn test_path_of_only_separators() {
        let job = job(DumpType::Tar, &[("path", "/")]);
        assert!(TarProducer::new("tar")
            .build_command_line(&job, Path::new("/tmp/srv"))
            .is_err());
    }
}
