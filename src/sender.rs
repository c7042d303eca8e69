//! HTTP transport for the controller REST API.
//!
//! [`Sender`] is the trait seam between request orchestration and the wire:
//! one call, one round trip, one raw decoded envelope back. [`HttpSender`]
//! is the production implementation over a blocking reqwest client; tests
//! substitute their own senders to exercise the layers above without a
//! network.

use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use reqwest::{header, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Request verbs accepted by the controller API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    /// Read a resource
    Get,
    /// Create a resource
    Post,
    /// Replace a resource
    Put,
    /// Remove a resource
    Delete,
}

impl Verb {
    /// Returns true for verbs that change controller state.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Verb::Get)
    }

    /// The upper-case wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "DELETE" => Ok(Verb::Delete),
            _ => Err(Error::InvalidVerb(s.to_string())),
        }
    }
}

/// Transport seam for issuing one controller request per call.
///
/// Implementations must perform exactly one network round trip per
/// [`send`](Sender::send) and return the raw decoded JSON envelope without
/// interpreting it; classification belongs to
/// [`ResponseHandler`](crate::response::ResponseHandler).
pub trait Sender {
    /// Issues one request and returns the decoded response envelope.
    fn send(&mut self, verb: Verb, path: &str, payload: Option<&Value>) -> Result<Value>;
}

/// Blocking HTTP implementation of [`Sender`].
///
/// The library is single-threaded and synchronous by design; every send is
/// a blocking round trip bounded by the configured request timeout.
pub struct HttpSender {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpSender {
    /// Builds a sender from controller connection settings.
    pub fn new(config: &ControllerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.div_ceil(2)))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| Error::Transport {
                verb: Verb::Get,
                path: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let base_url = Url::parse(&config.host)?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Replaces the session token sent with every request.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }
}

impl Sender for HttpSender {
    fn send(&mut self, verb: Verb, path: &str, payload: Option<&Value>) -> Result<Value> {
        if path.is_empty() {
            return Err(Error::missing_parameter("HttpSender", "path", "send"));
        }

        let url = self.base_url.join(path)?;
        let mut request = self.client.request(verb.method(), url);

        // NDFC reads the session token from its own header; keep the
        // standard one populated as well for proxies in the path.
        if let Some(ref token) = self.token {
            request = request
                .header("Dcnm-Token", token.as_str())
                .header(header::AUTHORIZATION, token.as_str());
        }

        if let Some(body) = payload {
            if !body.is_object() {
                return Err(Error::InvalidPayload {
                    verb,
                    path: path.to_string(),
                });
            }
            request = request.json(body);
        }

        trace!(%verb, path, has_payload = payload.is_some(), "sending controller request");

        let response = request.send().map_err(|e| Error::Transport {
            verb,
            path: path.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let envelope: Value = response.json().map_err(|e| Error::Transport {
            verb,
            path: path.to_string(),
            message: format!("response body is not JSON: {e}"),
        })?;

        debug!(%verb, path, %status, "controller responded");
        Ok(envelope)
    }
}
