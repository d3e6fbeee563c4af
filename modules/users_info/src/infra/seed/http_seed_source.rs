use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use crate::domain::ports::{ExternalUser, SeedSource, SeedSourceError};

/// Single HTTP adapter implementing the SeedSource port.
/// Reads `<base>/users` from a JSONPlaceholder-compatible directory.
pub struct HttpSeedSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSeedSource {
    /// Every request is bounded by `timeout`.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, SeedSourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SeedSourceError::Transport(e.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn from_str_url(base: &str, timeout: Duration) -> Result<Self, SeedSourceError> {
        let base = Url::parse(base)
            .map_err(|e| SeedSourceError::Transport(format!("invalid base URL '{base}': {e}")))?;
        Self::new(base, timeout)
    }

    fn users_url(&self) -> Result<Url, SeedSourceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SeedSourceError::Transport("base URL cannot hold a path".into()))?
            .pop_if_empty()
            .push("users");
        Ok(url)
    }
}

fn classify(e: reqwest::Error) -> SeedSourceError {
    if e.is_timeout() {
        SeedSourceError::Timeout
    } else if e.is_decode() {
        SeedSourceError::Decode(e.to_string())
    } else {
        SeedSourceError::Transport(e.to_string())
    }
}

#[async_trait]
impl SeedSource for HttpSeedSource {
    #[instrument(name = "users_info.http.seed.fetch_users", skip_all, fields(base = %self.base))]
    async fn fetch_users(&self) -> Result<Vec<ExternalUser>, SeedSourceError> {
        let url = self.users_url()?;
        debug!(%url, "GET seed users");

        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SeedSourceError::Status(status.as_u16()));
        }

        let users = response
            .json::<Vec<ExternalUser>>()
            .await
            .map_err(classify)?;
        debug!(count = users.len(), "seed users received");
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_url_appends_segment() {
        let t = Duration::from_secs(1);
        let s = HttpSeedSource::from_str_url("https://jsonplaceholder.typicode.com", t).unwrap();
        assert_eq!(
            s.users_url().unwrap().as_str(),
            "https://jsonplaceholder.typicode.com/users"
        );

        let s = HttpSeedSource::from_str_url("http://mirror.local/api/", t).unwrap();
        assert_eq!(s.users_url().unwrap().as_str(), "http://mirror.local/api/users");
    }

    #[test]
    fn rejects_unparseable_base() {
        assert!(matches!(
            HttpSeedSource::from_str_url("not a url", Duration::from_secs(1)),
            Err(SeedSourceError::Transport(_))
        ));
    }
}
