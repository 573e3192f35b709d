// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::TransportError;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// The two kinds of request the Zoho endpoints need.
pub trait Transport {
    /// POST an `application/x-www-form-urlencoded` body.
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Response, TransportError>;

    /// POST with a bearer token and the parameters in the query string.
    fn post_query(
        &self,
        url: &str,
        bearer: &str,
        query: &[(&str, String)],
    ) -> Result<Response, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError {
                url: String::new(),
                reason: format!("could not build HTTP client: {err}"),
            })?;
        Ok(Self { client })
    }

    fn finish(
        url: &str,
        result: reqwest::Result<reqwest::blocking::Response>,
    ) -> Result<Response, TransportError> {
        let to_error = |err: reqwest::Error| TransportError {
            url: url.to_owned(),
            reason: err.to_string(),
        };
        let response = result.map_err(to_error)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(to_error)?;
        log::trace!("POST {url} returned {status}");
        Ok(Response { status, body })
    }
}

impl Transport for ReqwestTransport {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Response, TransportError> {
        log::debug!("POST {url} (form)");
        Self::finish(url, self.client.post(url).form(form).send())
    }

    fn post_query(
        &self,
        url: &str,
        bearer: &str,
        query: &[(&str, String)],
    ) -> Result<Response, TransportError> {
        log::debug!("POST {url} (query)");
        let request = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(query);
        Self::finish(url, request.send())
    }
}
