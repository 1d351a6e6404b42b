//! TMDB client for the discover listing, movie details and credits.
//!
//! API reference: <https://developer.themoviedb.org/reference/intro/getting-started>
//!
//! Every request is a single attempt. Failures come back as tagged
//! [`AppError`]s and the calling stage decides what they mean.

use std::time::Duration;

use marquee_core::error::AppError;
use marquee_core::models::{Document, EntityId};
use marquee_core::traits::CatalogClient;
use marquee_core::{Credential, HttpConfig};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

/// Fixed query of the popularity listing.
const DISCOVER_QUERY: [(&str, &str); 4] = [
    ("include_adult", "false"),
    ("include_video", "false"),
    ("language", "en-US"),
    ("sort_by", "popularity.desc"),
];

/// One page of `GET /discover/movie`.
///
/// Only the ids are kept; the rest of each listing entry is ignored.
#[derive(Deserialize, Debug)]
struct DiscoverPage {
    #[serde(default)]
    results: Vec<DiscoverResult>,
}

#[derive(Deserialize, Debug)]
struct DiscoverResult {
    id: EntityId,
}

/// HTTP client for the TMDB v3 API.
///
/// # Examples
///
/// ```no_run
/// use marquee_client::TmdbClient;
/// use marquee_core::traits::CatalogClient;
/// use marquee_core::{Credential, HttpConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TmdbClient::new("https://api.themoviedb.org/3", &HttpConfig::default())?;
/// let credential = Credential::new(std::env::var("MOVIE_API_TOKEN")?)?;
/// let ids = client.list_page(&credential, 1).await?;
/// println!("Found {} movies on page 1", ids.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl TmdbClient {
    /// Creates a client for the API rooted at `base_url_str`.
    ///
    /// A trailing slash is added when missing so the version segment
    /// (`/3`) survives joining endpoint paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the URL is invalid or malformed.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(base_url_str: &str, http_config: &HttpConfig) -> Result<Self, AppError> {
        let normalized = if base_url_str.ends_with('/') {
            base_url_str.to_string()
        } else {
            format!("{}/", base_url_str)
        };
        let base_url =
            Url::parse(&normalized).map_err(|_| AppError::InvalidUrl(base_url_str.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::InvalidUrl(base_url_str.to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("Marquee/", env!("CARGO_PKG_VERSION")))
            .timeout(http_config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout: http_config.timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn discover_url(&self, page: u32) -> Result<Url, AppError> {
        let mut url = self.endpoint("discover/movie")?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in DISCOVER_QUERY {
                query.append_pair(key, value);
            }
            query.append_pair("page", &page.to_string());
        }
        Ok(url)
    }

    fn movie_url(&self, id: EntityId) -> Result<Url, AppError> {
        self.endpoint(&format!("movie/{}", id))
    }

    fn credits_url(&self, id: EntityId) -> Result<Url, AppError> {
        self.endpoint(&format!("movie/{}/credits", id))
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InvalidUrl(e.to_string()))
    }

    /// Sends one authenticated GET and decodes the JSON body.
    async fn get_json<T>(&self, credential: &Credential, url: Url) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        tracing::debug!(url = %url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(status, &url));
        }

        resp.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout.as_secs())
            } else {
                AppError::ClientError(format!("Invalid response from {}: {}", url, e))
            }
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout.as_secs())
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {}", e))
        } else {
            AppError::ClientError(e.to_string())
        }
    }
}

/// Maps a non-success HTTP status to an error.
fn status_error(status: StatusCode, url: &Url) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized,
        StatusCode::NOT_FOUND => AppError::NotFound(url.path().to_string()),
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimitExceeded,
        _ => AppError::ClientError(format!("HTTP {} from {}", status.as_u16(), url)),
    }
}

impl CatalogClient for TmdbClient {
    async fn list_page(
        &self,
        credential: &Credential,
        page: u32,
    ) -> Result<Vec<EntityId>, AppError> {
        let url = self.discover_url(page)?;
        let body: DiscoverPage = self.get_json(credential, url).await?;
        Ok(body.results.into_iter().map(|r| r.id).collect())
    }

    async fn get_detail(
        &self,
        credential: &Credential,
        id: EntityId,
    ) -> Result<Document, AppError> {
        let url = self.movie_url(id)?;
        self.get_json(credential, url).await
    }

    async fn get_related_set(
        &self,
        credential: &Credential,
        id: EntityId,
    ) -> Result<Document, AppError> {
        let url = self.credits_url(id)?;
        self.get_json(credential, url).await
    }
}
