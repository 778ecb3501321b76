// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the Zhonghong gateway API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{GatewayError, ProtocolError, Result};
use crate::protocol::Gateway;
use crate::state::UnitState;

/// Endpoint serving every gateway operation.
const API_PATH: &str = "/cgi-bin/api.html";

/// Function code of the unit list query.
const FN_LIST_UNITS: &str = "17";

/// Function code of the unit write request.
const FN_WRITE_UNIT: &str = "18";

/// Sub-page code sent with every request.
const PAGE: &str = "0";

// ============================================================================
// GatewayConfig
// ============================================================================

/// Connection parameters for a gateway.
///
/// # Examples
///
/// ```
/// use zhonghong_bridge::protocol::GatewayConfig;
/// use std::time::Duration;
///
/// let config = GatewayConfig::new("192.168.1.10")
///     .with_port(8080)
///     .with_credentials("admin", "password")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://192.168.1.10:8080");
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl GatewayConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the specified host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets Basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the credentials if set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.port == Self::DEFAULT_PORT {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }

    /// Creates an [`HttpGateway`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> std::result::Result<HttpGateway, ProtocolError> {
        if self.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "gateway host is required".to_string(),
            ));
        }

        let base_url = self.base_url();

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        let credentials = self
            .credentials
            .map(|(username, password)| Credentials { username, password });

        Ok(HttpGateway {
            base_url,
            client,
            credentials,
        })
    }
}

// ============================================================================
// HttpGateway
// ============================================================================

/// HTTP client for a Zhonghong gateway.
///
/// Every operation is a `GET` on `/cgi-bin/api.html` with keyed query
/// parameters; the gateway answers with JSON carrying an `err` status field.
/// One attempt per call, no retries.
///
/// # Examples
///
/// ```no_run
/// use zhonghong_bridge::protocol::{Gateway, GatewayConfig};
///
/// # async fn example() -> zhonghong_bridge::Result<()> {
/// let gateway = GatewayConfig::new("192.168.1.10")
///     .with_credentials("admin", "admin")
///     .into_client()?;
///
/// for unit in gateway.list_units().await? {
///     println!("{}: {}", unit.address, unit.mode);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    client: Client,
    credentials: Option<Credentials>,
}

/// HTTP Basic authentication credentials.
#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: String,
}

/// Status envelope shared by every gateway response.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    err: i64,
}

/// Body of the unit list response.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    unit: Vec<UnitState>,
}

impl HttpGateway {
    /// Returns the base URL of the gateway.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends keyed parameters to the API endpoint and returns the raw body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails, the gateway rejects the
    /// credentials, or the HTTP status is not a success.
    pub async fn request(
        &self,
        params: &[(&str, String)],
    ) -> std::result::Result<String, ProtocolError> {
        let url = format!("{}{API_PATH}", self.base_url);

        tracing::debug!(url = %url, ?params, "Sending gateway request");

        let mut request = self.client.get(&url).query(params);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await.map_err(ProtocolError::Http)?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::debug!(body = %body, "Received gateway response");

        Ok(body)
    }

    /// Sends a request and decodes the body after checking its status.
    async fn call<T: DeserializeOwned>(
        &self,
        function: &'static str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let body = self
            .request(params)
            .await
            .map_err(|source| GatewayError::Request { function, source })?;
        parse_response(function, &body)
    }
}

/// Checks the `err` field, then decodes the full body.
fn parse_response<T: DeserializeOwned>(function: &'static str, body: &str) -> Result<T> {
    let status: StatusResponse =
        serde_json::from_str(body).map_err(|source| GatewayError::Parse { function, source })?;

    if status.err != 0 {
        return Err(GatewayError::Status {
            function,
            code: status.err,
        }
        .into());
    }

    serde_json::from_str(body)
        .map_err(|source| GatewayError::Parse { function, source }.into())
}

impl Gateway for HttpGateway {
    async fn list_units(&self) -> Result<Vec<UnitState>> {
        let params = [("f", FN_LIST_UNITS.to_string()), ("p", PAGE.to_string())];
        let response: ListResponse = self.call("list units", &params).await?;
        Ok(response.unit)
    }

    async fn write_unit(&self, index: usize, fields: Vec<(&'static str, String)>) -> Result<()> {
        let mut params: Vec<(&str, String)> = vec![
            ("f", FN_WRITE_UNIT.to_string()),
            ("p", PAGE.to_string()),
            ("idx", index.to_string()),
        ];
        params.extend(fields);

        let _: StatusResponse = self.call("write unit", &params).await?;
        Ok(())
    }
}
