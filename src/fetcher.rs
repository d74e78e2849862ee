use reqwest::blocking::Client;
use reqwest::redirect;

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};

const MAX_REDIRECTS: usize = 100;

/// Blocking GET access to pages and assets.
pub trait Fetch {
    fn get_text(&self, url: &str) -> Result<String>;
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let redirect_policy = redirect::Policy::custom(|attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                attempt.error("Too many redirects (>100)")
            } else {
                attempt.follow()
            }
        });

        let mut builder = Client::builder().redirect(redirect_policy);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| ScrapeError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn send(&self, url: &str) -> Result<reqwest::blocking::Response> {
        self.client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| ScrapeError::network(url, e))
    }
}

impl Fetch for HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String> {
        self.send(url)?
            .text()
            .map_err(|e| ScrapeError::network(url, e))
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.send(url)?
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ScrapeError::network(url, e))
    }
}
