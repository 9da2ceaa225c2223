//! Configuration, built from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use sqlx::mysql::MySqlConnectOptions;

use crate::error::ConfigError;

const DEFAULT_LIMS_DATABASE: &str = "serology";
const DEFAULT_MILESTONE_DB: &str = ".neut_milestones.db";
const DEFAULT_MYSQL_PORT: u16 = 3306;

/// One of the two independent checks a run can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Reconcile,
    Milestones,
}

impl FromStr for PipelineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "reconcile" => Ok(PipelineKind::Reconcile),
            "milestones" => Ok(PipelineKind::Milestones),
            other => Err(ConfigError::InvalidValue {
                key: "STITCH_WATCH_PIPELINES".into(),
                message: format!("unknown pipeline '{other}'"),
            }),
        }
    }
}

/// LIMS (MySQL) connection parameters.
#[derive(Debug)]
pub struct LimsConfig {
    pub user: String,
    pub password: SecretString,
    /// `host`, `host:port` or `[v6addr]:port`.
    pub host: String,
    pub database: String,
}

impl LimsConfig {
    /// Connect options for the LIMS.
    ///
    /// The session keeps the server's time zone: the launcher stores naive
    /// UTC strings in `TIMESTAMP` columns, which only read back unshifted
    /// under the zone they were written in.
    pub fn connect_options(&self) -> Result<MySqlConnectOptions, ConfigError> {
        let (host, port) = split_host_port(&self.host)?;
        Ok(MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.database)
            .timezone(None::<String>))
    }
}

/// Split `host`, `host:port`, `[v6addr]` or `[v6addr]:port`.
///
/// A bare IPv6 literal (more than one colon, no brackets) is taken as a host
/// on the default port.
fn split_host_port(spec: &str) -> Result<(&str, u16), ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "NE_HOST".into(),
        message: format!("invalid host '{spec}'"),
    };
    let parse_port = |port: &str| port.parse::<u16>().map_err(|_| invalid());

    if let Some(rest) = spec.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        return match tail {
            "" => Ok((host, DEFAULT_MYSQL_PORT)),
            _ => {
                let port = tail.strip_prefix(':').ok_or_else(invalid)?;
                Ok((host, parse_port(port)?))
            }
        };
    }

    match spec.split_once(':') {
        Some((host, port)) if !port.contains(':') => Ok((host, parse_port(port)?)),
        _ => Ok((spec, DEFAULT_MYSQL_PORT)),
    }
}

/// Everything one invocation needs.
#[derive(Debug)]
pub struct WatchConfig {
    pub lims: LimsConfig,
    pub webhook_url: SecretString,
    /// Initialise the counter store instead of opening an existing one.
    pub create_counters: bool,
    pub milestone_db_path: PathBuf,
    pub pipelines: Vec<PipelineKind>,
    /// When set, run on this cron schedule instead of once.
    pub schedule: Option<cron::Schedule>,
}

impl WatchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let host_var = if flag(lookup("NE_USE_TEST_HOST")) {
            "NE_HOST_TEST"
        } else {
            "NE_HOST_PROD"
        };

        let lims = LimsConfig {
            user: required("NE_USER")?,
            password: SecretString::from(required("NE_PASSWORD")?),
            host: required(host_var)?,
            database: lookup("NE_DATABASE").unwrap_or_else(|| DEFAULT_LIMS_DATABASE.to_string()),
        };

        let webhook_url = SecretString::from(required("SLACK_WEBHOOK_NEUTRALISATION")?);

        let milestone_db_path = lookup("STITCH_WATCH_MILESTONE_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = lookup("HOME").unwrap_or_else(|| ".".to_string());
                PathBuf::from(home).join(DEFAULT_MILESTONE_DB)
            });

        let pipelines = match lookup("STITCH_WATCH_PIPELINES") {
            Some(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(PipelineKind::from_str)
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![PipelineKind::Reconcile, PipelineKind::Milestones],
        };
        if pipelines.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "STITCH_WATCH_PIPELINES".into(),
                message: "no pipelines selected".into(),
            });
        }

        let schedule = lookup("STITCH_WATCH_SCHEDULE")
            .filter(|s| !s.trim().is_empty())
            .map(|expr| {
                cron::Schedule::from_str(&expr).map_err(|e| ConfigError::InvalidValue {
                    key: "STITCH_WATCH_SCHEDULE".into(),
                    message: format!("invalid cron: {e}"),
                })
            })
            .transpose()?;

        Ok(Self {
            lims,
            webhook_url,
            create_counters: flag(lookup("CREATE")),
            milestone_db_path,
            pipelines,
            schedule,
        })
    }
}

fn flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("1") | Some("true") | Some("yes")
    )
}
