use anyhow::{Context, Result};
#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::Mutex;

/// Trait for downloading release artifacts, allowing for mocking in tests
pub trait ArtifactFetcher: Send + Sync {
    /// Download the resource at `url` and return its body
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Real fetcher using a blocking reqwest client (follows redirects)
pub struct HttpArtifactFetcher {
    client: reqwest::blocking::Client,
}

impl HttpArtifactFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpArtifactFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactFetcher for HttpArtifactFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to download {}", url))?
            .error_for_status()
            .with_context(|| format!("Download failed: {}", url))?;

        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read response body from {}", url))?;

        Ok(bytes.to_vec())
    }
}

/// Mock fetcher serving canned bodies by URL
#[cfg(test)]
pub struct MockArtifactFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockArtifactFetcher {
    pub fn new() -> Self {
        Self {
            bodies: HashMap::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_body(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_string(), body.to_vec());
        self
    }

    /// URLs requested so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Default for MockArtifactFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl ArtifactFetcher for MockArtifactFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requested.lock().unwrap().push(url.to_string());

        self.bodies
            .get(url)
            .cloned()
            .with_context(|| format!("Download failed: {} (404 Not Found)", url))
    }
}
