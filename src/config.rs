// SPDX-License-Identifier: MPL-2.0

use std::{fs::read_to_string, path::PathBuf, time::Duration};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    calendar::{DateRange, Preset, SkipPolicy},
    credentials::{CredentialSource, EnvCredentials, FileCredentials},
    error::ConfigError,
    timelog::TimelogTemplate,
};

const APP_NAME: &str = "timelogtool";
pub const DEFAULT_API_DOMAIN: &str = "https://people.zoho.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_local_dir()
        .map(|dir| dir.join(APP_NAME).join("config.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

pub fn load_config(config_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let path = match config_path {
        Some(path) => path,
        None => default_config_path()?,
    };
    log::debug!("Reading configuration at path {:?}", &path);
    let contents = read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = parse_config(path, &contents)?;
    log::info!("Loaded configuration from {:?}", config.path);
    Ok(config)
}

pub fn parse_config(path: PathBuf, contents: &str) -> Result<Config, ConfigError> {
    let config_toml: PartialConfig =
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

    let api = config_toml.api;
    let timeout = Duration::from_secs(api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    log::trace!("Config: api timeout is {:?}", &timeout);

    let timelog = config_toml.timelog;
    let hours = timelog.hours.ok_or(ConfigError::Missing("timelog.hours"))?;
    if !(hours.is_finite() && hours > 0.0) {
        return Err(ConfigError::Invalid {
            key: "timelog.hours",
            reason: format!("expected a positive number of hours, got {hours}"),
        });
    }

    let defaults = TimelogDefaults {
        from_date: parse_date("timelog.from_date", timelog.from_date)?,
        to_date: parse_date("timelog.to_date", timelog.to_date)?,
        template: TimelogTemplate {
            job_id: timelog.job_id.ok_or(ConfigError::Missing("timelog.job_id"))?,
            hours,
            user: timelog.user.ok_or(ConfigError::Missing("timelog.user"))?,
            work_item: timelog.work_item,
        },
    };

    Ok(Config {
        path,
        source: api.source,
        api_domain: api
            .api_domain
            .unwrap_or_else(|| DEFAULT_API_DOMAIN.to_owned()),
        timeout,
        timelog: defaults,
        weekly_work_item: config_toml.presets.weekly_work_item,
        monthly_work_item: config_toml.presets.monthly_work_item,
        holidays: clean_dates("holidays.dates", config_toml.holidays.dates)?,
        leaves: clean_dates("leaves.dates", config_toml.leaves.dates)?,
    })
}

/// Dates may be written quoted (`"2024-04-01"`) or as TOML local dates
/// (`2024-04-01`).
fn date_text(key: &'static str, value: toml::Value) -> Result<String, ConfigError> {
    match value {
        toml::Value::String(text) => Ok(text.trim().to_owned()),
        toml::Value::Datetime(datetime)
            if datetime.date.is_some() && datetime.time.is_none() && datetime.offset.is_none() =>
        {
            Ok(datetime.to_string())
        }
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a YYYY-MM-DD date, got {other}"),
        }),
    }
}

fn parse_date(
    key: &'static str,
    value: Option<toml::Value>,
) -> Result<Option<NaiveDate>, ConfigError> {
    value
        .map(|value| {
            let text = date_text(key, value)?;
            NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|err| ConfigError::Invalid {
                key,
                reason: format!("{text:?} is not a YYYY-MM-DD date ({err})"),
            })
        })
        .transpose()
}

fn clean_dates(key: &'static str, dates: Vec<toml::Value>) -> Result<Vec<String>, ConfigError> {
    let mut cleaned = Vec::with_capacity(dates.len());
    for date in dates {
        let date = date_text(key, date)?;
        if date.is_empty() {
            continue;
        }
        if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
            log::warn!("{key} entry {date:?} is not a YYYY-MM-DD date and will never match");
        }
        cleaned.push(date);
    }
    Ok(cleaned)
}

#[derive(Debug)]
pub struct Config {
    pub path: PathBuf,
    pub source: SourceKind,
    pub api_domain: String,
    pub timeout: Duration,
    pub timelog: TimelogDefaults,
    pub weekly_work_item: Option<String>,
    pub monthly_work_item: Option<String>,
    pub holidays: Vec<String>,
    pub leaves: Vec<String>,
}

#[derive(Debug)]
pub struct TimelogDefaults {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub template: TimelogTemplate,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    File,
    Env,
}

impl Config {
    /// `dotenv_path` is the `.env` file loaded at startup, if any.  A rotated
    /// refresh token for the env source is written back there.
    pub fn credential_source(&self, dotenv_path: Option<PathBuf>) -> Box<dyn CredentialSource> {
        match self.source {
            SourceKind::File => Box::new(FileCredentials::new(&self.path)),
            SourceKind::Env => Box::new(EnvCredentials::from_dotenv(
                dotenv_path.unwrap_or_else(|| PathBuf::from(".env")),
            )),
        }
    }

    pub fn skip_policy(&self) -> SkipPolicy {
        SkipPolicy::new(self.holidays.iter().cloned(), self.leaves.iter().cloned())
    }

    /// The dates to submit and the entry to submit for each of them.
    ///
    /// Without a preset the range comes from `timelog.from_date` and
    /// `timelog.to_date`.  With a preset the range is derived from `today`
    /// and the work item is replaced by the preset's own.
    pub fn plan(
        &self,
        preset: Option<Preset>,
        today: NaiveDate,
    ) -> Result<(DateRange, TimelogTemplate), ConfigError> {
        let mut template = self.timelog.template.clone();
        let range = match preset {
            Some(preset) => {
                template.work_item = match preset {
                    Preset::Weekly => self.weekly_work_item.clone(),
                    Preset::Monthly => self.monthly_work_item.clone(),
                };
                preset.range(today)
            }
            None => DateRange::new(
                self.timelog
                    .from_date
                    .ok_or(ConfigError::Missing("timelog.from_date"))?,
                self.timelog
                    .to_date
                    .ok_or(ConfigError::Missing("timelog.to_date"))?,
            ),
        };
        Ok((range, template))
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PartialConfig {
    api: PartialApi,
    timelog: PartialTimelog,
    presets: PartialPresets,
    holidays: DateList,
    leaves: DateList,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PartialApi {
    source: SourceKind,
    api_domain: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PartialTimelog {
    from_date: Option<toml::Value>,
    to_date: Option<toml::Value>,
    job_id: Option<String>,
    hours: Option<f64>,
    user: Option<String>,
    work_item: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PartialPresets {
    weekly_work_item: Option<String>,
    monthly_work_item: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct DateList {
    dates: Vec<toml::Value>,
}
