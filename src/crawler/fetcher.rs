// crawler/fetcher.rs
use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

use crate::crawler::FetchError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Returns raw page content for a URL.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Identities to rotate through. One is picked at random per request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestProfile {
    pub user_agents: Vec<String>,
    /// Proxy URLs, e.g. "http://36.6.144.153:8089". Empty means direct.
    pub proxies: Vec<String>,
    pub cookie: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RequestProfile {
    fn default() -> Self {
        Self {
            user_agents: vec![DEFAULT_USER_AGENT.to_string()],
            proxies: Vec::new(),
            cookie: None,
            timeout_secs: 60,
        }
    }
}

pub struct HttpFetcher {
    clients: Vec<Client>,
    user_agents: Vec<String>,
    cookie: Option<HeaderValue>,
}

impl HttpFetcher {
    pub fn new(profile: &RequestProfile) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(profile.timeout_secs);

        let mut clients = Vec::new();
        if profile.proxies.is_empty() {
            clients.push(Client::builder().timeout(timeout).build()?);
        }
        for proxy in &profile.proxies {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| FetchError::Config(format!("bad proxy {proxy}: {e}")))?;
            clients.push(Client::builder().timeout(timeout).proxy(proxy).build()?);
        }

        let cookie = profile
            .cookie
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .map_err(|e| FetchError::Config(format!("bad cookie: {e}")))?;

        let user_agents = if profile.user_agents.is_empty() {
            vec![DEFAULT_USER_AGENT.to_string()]
        } else {
            profile.user_agents.clone()
        };

        Ok(Self {
            clients,
            user_agents,
            cookie,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut rng = rand::thread_rng();
        let client = self
            .clients
            .choose(&mut rng)
            .ok_or_else(|| FetchError::Config("no HTTP client configured".into()))?;

        let mut headers = HeaderMap::new();
        if let Some(ua) = self.user_agents.choose(&mut rng) {
            let value = HeaderValue::from_str(ua)
                .map_err(|e| FetchError::Config(format!("bad user agent: {e}")))?;
            headers.insert(USER_AGENT, value);
        }
        if let Some(cookie) = &self.cookie {
            headers.insert(COOKIE, cookie.clone());
        }

        let resp = client.get(url).headers(headers).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(resp.text()?)
    }
}
