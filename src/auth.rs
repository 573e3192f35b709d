// SPDX-License-Identifier: MPL-2.0

use std::fmt;

use serde::Deserialize;

use crate::{
    credentials::{Credentials, Grant},
    error::AuthError,
    http::Transport,
};

/// Bearer token for the timelog API.  Lives for a single run.
#[derive(Clone, PartialEq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Result of a successful token exchange.
#[derive(Debug)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    /// Set when an authorization code was exchanged.  The caller is
    /// responsible for storing it for the next run.
    pub new_refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    error: Option<String>,
}

pub struct Authenticator<'a, T> {
    transport: &'a T,
    credentials: &'a Credentials,
}

impl<'a, T: Transport> Authenticator<'a, T> {
    pub fn new(transport: &'a T, credentials: &'a Credentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn get_access_token(&self) -> Result<TokenGrant, AuthError> {
        match self.credentials.grant() {
            Some(Grant::RefreshToken(refresh_token)) => {
                log::debug!("Requesting access token with refresh token");
                let (access_token, _) = self.request(
                    "refresh_token",
                    &[
                        ("grant_type", "refresh_token"),
                        ("refresh_token", refresh_token),
                    ],
                )?;
                Ok(TokenGrant {
                    access_token,
                    new_refresh_token: None,
                })
            }
            Some(Grant::AuthorizationCode(code)) => {
                log::debug!("Requesting access token with authorization code");
                let (access_token, refresh_token) = self.request(
                    "authorization_code",
                    &[("grant_type", "authorization_code"), ("code", code)],
                )?;
                if refresh_token.is_none() {
                    log::warn!("Token endpoint did not return a refresh token for the auth code");
                }
                Ok(TokenGrant {
                    access_token,
                    new_refresh_token: refresh_token,
                })
            }
            None => Err(AuthError::NoCredential),
        }
    }

    fn request(
        &self,
        grant: &'static str,
        params: &[(&str, &str)],
    ) -> Result<(AccessToken, Option<String>), AuthError> {
        let mut form = params.to_vec();
        form.push(("client_id", self.credentials.client_id.as_str()));
        form.push(("client_secret", self.credentials.client_secret.as_str()));

        let response = self
            .transport
            .post_form(&self.credentials.token_url(), &form)?;
        if !response.is_ok() {
            return Err(AuthError::Rejected {
                grant,
                status: response.status,
                body: response.body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|err| AuthError::InvalidResponse(err.to_string()))?;
        match parsed.access_token.filter(|token| !token.is_empty()) {
            Some(token) => Ok((
                AccessToken::new(token),
                parsed.refresh_token.filter(|token| !token.is_empty()),
            )),
            None => Err(AuthError::InvalidResponse(match parsed.error {
                Some(error) => format!("{grant} grant failed: {error}"),
                None => "response has no access_token".to_owned(),
            })),
        }
    }
}
