use crate::error::Result;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Request headers as plain name/value pairs
pub type Headers = BTreeMap<String, String>;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; sonde/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Status and raw body of a probe request. Status 0 means the request never
/// produced an HTTP response (DNS, connect, TLS or timeout failure).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ProbeResponse {
    pub fn transport_failure() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Minimal GET / JSON-POST client shared by every discovery strategy.
///
/// Certificate verification is off: discovery routinely targets internal and
/// self-signed services.
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// GET `url`. Caller headers win over the default User-Agent.
    pub async fn try_get(
        &self,
        url: &str,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<ProbeResponse> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(ProbeResponse { status, body })
    }

    /// POST `payload` as JSON to `url`
    pub async fn try_post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<ProbeResponse> {
        let mut request = self.client.post(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.json(payload).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(ProbeResponse { status, body })
    }

    /// Infallible GET: transport failures come back as status 0 with an empty body
    pub async fn get(&self, url: &str, headers: &Headers, timeout: Duration) -> ProbeResponse {
        match self.try_get(url, headers, timeout).await {
            Ok(response) => {
                debug!("GET {} -> {}", url, response.status);
                response
            }
            Err(e) => {
                debug!("GET {} failed: {}", url, e);
                ProbeResponse::transport_failure()
            }
        }
    }

    /// Infallible JSON POST: transport failures come back as status 0 with an empty body
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
        headers: &Headers,
        timeout: Duration,
    ) -> ProbeResponse {
        match self.try_post_json(url, payload, headers, timeout).await {
            Ok(response) => {
                debug!("POST {} -> {}", url, response.status);
                response
            }
            Err(e) => {
                debug!("POST {} failed: {}", url, e);
                ProbeResponse::transport_failure()
            }
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// `Authorization: Bearer <token>`, or no headers for a missing/blank token
pub fn bearer_headers(token: Option<&str>) -> Headers {
    let mut headers = Headers::new();
    if let Some(token) = token.map(str::trim)
        && !token.is_empty()
    {
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
    }
    headers
}
