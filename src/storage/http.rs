//! HTTP object store
//!
//! Objects live at `<base_url>/<key>`. Reads are `GET`, writes `PUT`,
//! existence checks `HEAD`. Works against any bucket endpoint that accepts
//! plain or bearer-authenticated requests (presigned gateways, S3-compatible
//! proxies, a static file server for reads).

use std::io::Read;
use std::time::Duration;

use super::{ObjectStore, normalize_key};
use crate::error::{self, Result};

const TIMEOUT: Duration = Duration::from_secs(120);

pub struct HttpStore {
    base_url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(TIMEOUT).build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            agent,
        }
    }

    fn url(&self, key: &str) -> Result<String> {
        Ok(format!("{}/{}", self.base_url, normalize_key(key)?))
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let request = self.agent.request(method, url);
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }
}

impl ObjectStore for HttpStore {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.url(key)?;
        let response = self.request("GET", &url).call().map_err(|e| match e {
            ureq::Error::Status(404, _) => error::storage::not_found(key),
            ureq::Error::Status(code, _) => {
                error::storage::get_failed(key, format!("server responded with HTTP {code}"))
            }
            ureq::Error::Transport(t) => error::storage::get_failed(key, t.to_string()),
        })?;

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| error::storage::get_failed(key, e.to_string()))?;
        Ok(body)
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let url = self.url(key)?;
        self.request("PUT", &url)
            .set("Content-Type", "application/octet-stream")
            .send_bytes(data)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    error::storage::put_failed(key, format!("server responded with HTTP {code}"))
                }
                ureq::Error::Transport(t) => error::storage::put_failed(key, t.to_string()),
            })?;
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let url = self.url(key)?;
        match self.request("HEAD", &url).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(ureq::Error::Status(code, _)) => Err(error::storage::get_failed(
                key,
                format!("server responded with HTTP {code}"),
            )),
            Err(ureq::Error::Transport(t)) => Err(error::storage::get_failed(key, t.to_string())),
        }
    }

    fn location(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }
}
