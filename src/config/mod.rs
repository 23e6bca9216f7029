// dumpbox/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DUMP_PATH: &str = "dumps";

// Structs for deserializing config.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGlobalConfig {
    pub path: Option<PathBuf>,
    pub tmp_path: Option<PathBuf>,
    pub sh_executable: Option<String>,
    pub pgdump_executable: Option<String>,
    pub mysqldump_executable: Option<String>,
    pub mongodump5_executable: Option<String>,
    pub mongodump4_executable: Option<String>,
    pub gbak_executable: Option<String>,
    pub tar_executable: Option<String>,
    pub command_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawJobConfig {
    #[serde(rename = "type")]
    pub dump_type: DumpType,
    #[serde(default)]
    pub name: String,
    pub path: Option<PathBuf>,
    pub tmp_path: Option<PathBuf>,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    #[serde(default)]
    pub force_latest: bool,
    #[serde(default)]
    pub daily: bool,
    pub days: Option<i32>,
    #[serde(default)]
    pub weekly: bool,
    pub weeks: Option<i32>,
    #[serde(default)]
    pub monthly: bool,
    pub months: Option<i32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNotificationConfig {
    #[serde(default)]
    pub enabled: bool,
    pub url: Option<String>,
    pub channel: Option<String>,
    pub username: Option<String>,
    pub icon_url: Option<String>,
    pub icon_emoji: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    #[serde(default)]
    pub global: RawGlobalConfig,
    #[serde(default)]
    pub dumps: Vec<RawJobConfig>,
    #[serde(default)]
    pub notification: RawNotificationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpType {
    Postgres,
    Mysql,
    Mongo,
    MongoLegacy,
    FirebirdLegacy,
    Tar,
}

impl std::fmt::Display for DumpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DumpType::Postgres => "postgres",
            DumpType::Mysql => "mysql",
            DumpType::Mongo => "mongo",
            DumpType::MongoLegacy => "mongo_legacy",
            DumpType::FirebirdLegacy => "firebird_legacy",
            DumpType::Tar => "tar",
        };
        f.write_str(name)
    }
}

// Application's internal configuration structs
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub path: PathBuf,
    pub tmp_path: PathBuf,
    pub sh_executable: String,
    pub pgdump_executable: String,
    pub mysqldump_executable: String,
    pub mongodump5_executable: String,
    pub mongodump4_executable: String,
    pub gbak_executable: String,
    pub tar_executable: String,
    pub command_timeout: Option<Duration>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            path: PathBuf::from(DEFAULT_DUMP_PATH),
            tmp_path: PathBuf::new(),
            sh_executable: "sh".to_string(),
            pgdump_executable: "pg_dump".to_string(),
            mysqldump_executable: "mysqldump".to_string(),
            mongodump5_executable: "/mongodb5/bin/mongodump".to_string(),
            mongodump4_executable: "/mongodb4/bin/mongodump".to_string(),
            gbak_executable: "/opt/firebird/bin/gbak".to_string(),
            tar_executable: "tar".to_string(),
            command_timeout: None,
        }
    }
}

/// A periodic tier's switch and its retention bound. A negative bound keeps
/// every period forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSetting {
    pub enabled: bool,
    pub keep: i32,
}

#[derive(Debug, Clone)]
pub struct JobConfig {
    pub dump_type: DumpType,
    pub name: String,
    pub root_path: PathBuf,
    pub staging_path: PathBuf,
    pub vars: BTreeMap<String, String>,
    pub force_latest: bool,
    pub daily: TierSetting,
    pub weekly: TierSetting,
    pub monthly: TierSetting,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub url: String,
    pub channel: String,
    pub username: String,
    pub icon_url: String,
    pub icon_emoji: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub global: GlobalConfig,
    pub jobs: Vec<JobConfig>,
    pub notification: NotificationConfig,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        Self::from_json_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawJsonConfig =
            serde_json::from_str(content).context("Invalid configuration document")?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_raw(raw: RawJsonConfig) -> Self {
        let global = resolve_global(raw.global);
        let jobs = raw
            .dumps
            .into_iter()
            .map(|job| resolve_job(&global, job))
            .collect();
        let notification = resolve_notification(raw.notification);

        AppConfig {
            global,
            jobs,
            notification,
        }
    }

    /// Jobs selected by name on the command line; an empty filter selects all.
    pub fn selected_jobs<'a>(&'a self, filter: &'a [String]) -> impl Iterator<Item = &'a JobConfig> {
        self.jobs
            .iter()
            .filter(move |job| filter.is_empty() || filter.iter().any(|name| name == &job.name))
    }
}

fn resolve_global(raw: RawGlobalConfig) -> GlobalConfig {
    let defaults = GlobalConfig::default();
    GlobalConfig {
        path: raw.path.unwrap_or(defaults.path),
        tmp_path: raw.tmp_path.unwrap_or(defaults.tmp_path),
        sh_executable: raw.sh_executable.unwrap_or(defaults.sh_executable),
        pgdump_executable: raw.pgdump_executable.unwrap_or(defaults.pgdump_executable),
        mysqldump_executable: raw
            .mysqldump_executable
            .unwrap_or(defaults.mysqldump_executable),
        mongodump5_executable: raw
            .mongodump5_executable
            .unwrap_or(defaults.mongodump5_executable),
        mongodump4_executable: raw
            .mongodump4_executable
            .unwrap_or(defaults.mongodump4_executable),
        gbak_executable: raw.gbak_executable.unwrap_or(defaults.gbak_executable),
        tar_executable: raw.tar_executable.unwrap_or(defaults.tar_executable),
        command_timeout: raw.command_timeout_secs.map(Duration::from_secs),
    }
}

fn resolve_job(global: &GlobalConfig, raw: RawJobConfig) -> JobConfig {
    // Without an explicit path each job gets its own directory under the global root,
    // so two jobs never share a `latest` file.
    let root_path = match raw.path.filter(|p| !p.as_os_str().is_empty()) {
        Some(path) => path,
        None if global.path.as_os_str().is_empty() || raw.name.is_empty() => PathBuf::new(),
        None => global.path.join(&raw.name),
    };
    let staging_path = raw
        .tmp_path
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| global.tmp_path.clone());

    JobConfig {
        dump_type: raw.dump_type,
        name: raw.name,
        root_path,
        staging_path,
        vars: raw.vars,
        force_latest: raw.force_latest,
        daily: TierSetting {
            enabled: raw.daily,
            keep: raw.days.unwrap_or(-1),
        },
        weekly: TierSetting {
            enabled: raw.weekly,
            keep: raw.weeks.unwrap_or(-1),
        },
        monthly: TierSetting {
            enabled: raw.monthly,
            keep: raw.months.unwrap_or(-1),
        },
        timeout: raw
            .timeout_secs
            .map(Duration::from_secs)
            .or(global.command_timeout),
    }
}

fn resolve_notification(raw: RawNotificationConfig) -> NotificationConfig {
    let url = raw.url.unwrap_or_default();
    if raw.enabled && url.trim().is_empty() {
        tracing::warn!("notification is enabled in config.json but no url is set; notifications will be disabled");
    }
    NotificationConfig {
        enabled: raw.enabled && !url.trim().is_empty(),
        url,
        channel: raw.channel.unwrap_or_default(),
        username: raw.username.unwrap_or_default(),
        icon_url: raw.icon_url.unwrap_or_default(),
        icon_emoji: raw.icon_emoji.unwrap_or_default(),
    }
}
