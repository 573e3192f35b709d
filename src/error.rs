// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the configuration or the credential source.
///
/// These are raised before any network activity, except for
/// [`ConfigError::Persist`] which happens after a token exchange.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config at {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("missing configuration value `{0}`")]
    Missing(&'static str),

    #[error("invalid configuration value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("unknown preset `{0}` (expected `weekly` or `monthly`)")]
    UnknownPreset(String),

    #[error("could not determine a config directory, use --config to set a config file")]
    NoConfigDir,

    #[error("could not persist refresh token to {path:?}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

/// Low level failure talking to a remote endpoint (connection refused,
/// timeout, unreadable body).
#[derive(Debug, Error)]
#[error("request to {url} failed: {reason}")]
pub struct TransportError {
    pub url: String,
    pub reason: String,
}

/// Failure to obtain an access token. Always fatal for the run.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no refresh token or auth code available, set up initial authentication first")]
    NoCredential,

    #[error("token endpoint rejected the {grant} grant: {status}, {body}")]
    Rejected {
        grant: &'static str,
        status: u16,
        body: String,
    },

    #[error("token endpoint returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure to submit a single timelog. The run carries on with the next date.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("timelog endpoint returned {status}, {body}")]
    Rejected { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Fatal errors that stop a run before any timelog is submitted.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
