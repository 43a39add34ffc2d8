use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::redirect;

use crate::core::{HarnessError, Result};

const USER_AGENT: &str = concat!("onepay-harness/", env!("CARGO_PKG_VERSION"));

/// Uniform, observable HTTP calls with manual redirect control
///
/// The gateway's accept/reject signal is a redirect-vs-405 status, so the
/// probe must be able to stop at the first response instead of following
/// redirects. Non-2xx statuses are never errors here; only connection
/// failures and timeouts are. Retry is a runner policy, not a transport one.
pub struct HttpProbe {
    redirecting: reqwest::Client,
    manual: reqwest::Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub enum ProbeBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub method: ProbeMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: ProbeBody,
    pub follow_redirects: bool,
}

impl ProbeRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: ProbeMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: ProbeBody::Empty,
            follow_redirects: true,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: ProbeMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: ProbeBody::Json(body),
            follow_redirects: true,
        }
    }

    /// POST form pairs with redirects disabled, as gateway submissions need
    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: ProbeMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: ProbeBody::Form(form),
            follow_redirects: false,
        }
    }
}

/// Captured response: status, headers, body and timing, uniformly
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    /// Header names lowercased for case-insensitive lookup
    pub headers: HashMap<String, String>,
    pub body: String,
    pub elapsed_ms: u64,
}

impl ProbeResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl HttpProbe {
    /// Build a probe with the given per-call timeout
    ///
    /// Two underlying clients are prepared up front: redirect policy is a
    /// client-level setting in reqwest, and the probe needs both behaviors.
    pub fn new(timeout: Duration) -> Result<Self> {
        let build = |policy: redirect::Policy| {
            reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .redirect(policy)
                .build()
                .map_err(|e| {
                    HarnessError::configuration(format!("failed to build HTTP client: {}", e))
                })
        };

        Ok(Self {
            redirecting: build(redirect::Policy::limited(10))?,
            manual: build(redirect::Policy::none())?,
        })
    }

    /// Send one request and capture the response
    ///
    /// Never fails on a non-2xx status. A connection failure or timeout is a
    /// network error, with the cause discriminated in the message.
    pub async fn send(&self, request: &ProbeRequest) -> Result<ProbeResponse> {
        let client = if request.follow_redirects {
            &self.redirecting
        } else {
            &self.manual
        };

        let mut builder = match request.method {
            ProbeMethod::Get => client.get(&request.url),
            ProbeMethod::Post => client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            ProbeBody::Empty => builder,
            ProbeBody::Json(value) => builder.json(value),
            ProbeBody::Form(pairs) => builder.form(pairs),
        };

        let started = Instant::now();
        let response = builder.send().await.map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(classify_transport_error)?;

        Ok(ProbeResponse {
            status,
            headers,
            body,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

fn classify_transport_error(e: reqwest::Error) -> HarnessError {
    if e.is_timeout() {
        HarnessError::network(format!("timeout: {}", e))
    } else if e.is_connect() {
        HarnessError::network(format!("connection failed: {}", e))
    } else {
        HarnessError::network(e.to_string())
    }
}
