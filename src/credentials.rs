// SPDX-License-Identifier: MPL-2.0

//! Where OAuth client credentials come from, and where a rotated refresh
//! token goes back to.
//!
//! Two sources exist: the `[api]` table of the TOML config file, and the
//! process environment (usually seeded from a `.env` file).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_OAUTH_DOMAIN: &str = "https://accounts.zoho.com";

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
    pub auth_code: Option<String>,
    pub oauth_domain: String,
}

/// The token grant the credentials allow, refresh tokens taking priority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grant<'a> {
    RefreshToken(&'a str),
    AuthorizationCode(&'a str),
}

impl Credentials {
    pub fn grant(&self) -> Option<Grant<'_>> {
        if let Some(token) = non_empty(&self.refresh_token) {
            Some(Grant::RefreshToken(token))
        } else {
            non_empty(&self.auth_code).map(Grant::AuthorizationCode)
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/v2/token", self.oauth_domain.trim_end_matches('/'))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub trait CredentialSource {
    fn load(&self) -> Result<Credentials, ConfigError>;

    /// Overwrite the stored refresh token so the next run can use it.
    fn save_refresh_token(&self, refresh_token: &str) -> Result<(), ConfigError>;
}

/// Reads the `[api]` table of the config file.
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_table(&self) -> Result<toml::Table, ConfigError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl CredentialSource for FileCredentials {
    fn load(&self) -> Result<Credentials, ConfigError> {
        let table = self.read_table()?;
        let api = table.get("api").and_then(|api| api.as_table());
        let get = |key: &str| {
            api.and_then(|api| api.get(key))
                .and_then(|value| value.as_str())
                .map(str::to_owned)
        };

        Ok(Credentials {
            client_id: get("client_id").ok_or(ConfigError::Missing("api.client_id"))?,
            client_secret: get("client_secret")
                .ok_or(ConfigError::Missing("api.client_secret"))?,
            refresh_token: get("refresh_token"),
            auth_code: get("auth_code"),
            oauth_domain: get("oauth_domain").unwrap_or_else(|| DEFAULT_OAUTH_DOMAIN.to_owned()),
        })
    }

    fn save_refresh_token(&self, refresh_token: &str) -> Result<(), ConfigError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let mut doc = contents
            .parse::<toml_edit::DocumentMut>()
            .map_err(|err| ConfigError::Persist {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;

        if !doc.contains_key("api") {
            doc["api"] = toml_edit::Item::Table(toml_edit::Table::new());
        }
        let Some(api) = doc["api"].as_table_like_mut() else {
            return Err(ConfigError::Invalid {
                key: "api",
                reason: "expected a table".to_owned(),
            });
        };
        api.insert("refresh_token", toml_edit::value(refresh_token));

        replace_file(&self.path, &doc.to_string())?;
        log::info!("Refresh token saved to config file {:?}", self.path);
        Ok(())
    }
}

/// Reads credentials from environment variables, falling back to the dotenv
/// file, and persists a rotated refresh token into that same file.
pub struct EnvCredentials {
    dotenv_path: PathBuf,
    lookup: Box<dyn Fn(&str) -> Option<String>>,
}

impl EnvCredentials {
    pub const CLIENT_ID: &'static str = "CLIENT_ID";
    pub const CLIENT_SECRET: &'static str = "CLIENT_SECRET";
    pub const REFRESH_TOKEN: &'static str = "REFRESH_TOKEN";
    pub const AUTHORIZATION_CODE: &'static str = "AUTHORIZATION_CODE";
    pub const OAUTH_DOMAIN: &'static str = "ZOHO_OAUTH_DOMAIN";

    /// Credentials from the process environment, then from `dotenv_path`.
    ///
    /// `dotenv_path` should be the file `dotenvy::dotenv()` loaded, which may
    /// live in a parent of the working directory.
    pub fn from_dotenv(dotenv_path: impl Into<PathBuf>) -> Self {
        Self::layered(dotenv_path, |key| std::env::var(key).ok())
    }

    fn layered(
        dotenv_path: impl Into<PathBuf>,
        env: impl Fn(&str) -> Option<String> + 'static,
    ) -> Self {
        let dotenv_path = dotenv_path.into();
        let file = dotenv_path.clone();
        Self::with_lookup(dotenv_path, move |key| {
            env(key).or_else(|| read_dotenv_var(&file, key))
        })
    }

    pub fn with_lookup(
        dotenv_path: impl Into<PathBuf>,
        lookup: impl Fn(&str) -> Option<String> + 'static,
    ) -> Self {
        Self {
            dotenv_path: dotenv_path.into(),
            lookup: Box::new(lookup),
        }
    }
}

impl CredentialSource for EnvCredentials {
    fn load(&self) -> Result<Credentials, ConfigError> {
        let get = |key: &str| (self.lookup)(key).filter(|v| !v.trim().is_empty());
        Ok(Credentials {
            client_id: get(Self::CLIENT_ID).ok_or(ConfigError::Missing("CLIENT_ID"))?,
            client_secret: get(Self::CLIENT_SECRET).ok_or(ConfigError::Missing("CLIENT_SECRET"))?,
            refresh_token: get(Self::REFRESH_TOKEN),
            auth_code: get(Self::AUTHORIZATION_CODE),
            oauth_domain: get(Self::OAUTH_DOMAIN).unwrap_or_else(|| DEFAULT_OAUTH_DOMAIN.to_owned()),
        })
    }

    fn save_refresh_token(&self, refresh_token: &str) -> Result<(), ConfigError> {
        let existing = match fs::read_to_string(&self.dotenv_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.dotenv_path.clone(),
                    source,
                })
            }
        };
        let contents = set_dotenv_key(&existing, Self::REFRESH_TOKEN, refresh_token);
        replace_file(&self.dotenv_path, &contents)?;
        log::info!("Refresh token saved to {:?}", self.dotenv_path);
        Ok(())
    }
}

fn read_dotenv_var(path: &Path, key: &str) -> Option<String> {
    dotenvy::from_path_iter(path)
        .ok()?
        .filter_map(Result::ok)
        .find(|(name, _)| name == key)
        .map(|(_, value)| value)
}

/// Replace (or append) `key=value` in dotenv-formatted text, keeping every
/// other line as it was.
fn set_dotenv_key(contents: &str, key: &str, value: &str) -> String {
    let line = format!("{key}='{value}'");
    let mut replaced = false;
    let mut lines = contents
        .lines()
        .map(|existing| {
            let name = existing
                .trim_start()
                .trim_start_matches("export ")
                .split('=')
                .next()
                .unwrap_or("")
                .trim();
            if !replaced && name == key {
                replaced = true;
                line.clone()
            } else {
                existing.to_owned()
            }
        })
        .collect::<Vec<_>>();
    if !replaced {
        lines.push(line);
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Writes a sibling `.tmp` file and renames it over `path`.
fn replace_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let persist_error = |err: std::io::Error| ConfigError::Persist {
        path: path.to_owned(),
        reason: err.to_string(),
    };
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).map_err(persist_error)?;
    fs::rename(&tmp, path).map_err(persist_error)?;
    Ok(())
}
