use reqwest::StatusCode;
use snafu::{ResultExt as _, Snafu};
use tracing::debug;
use unfollow_core::Page;
use unfollow_core::wire::{FOLLOWERS_QUERY_HASH, FollowersQueryVariables, FollowersResponse};

use crate::transport::Transport;

const LOG_TARGET: &str = "unfollow::fetcher";

const FOLLOWERS_QUERY_PATH: &str = "/graphql/query";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FetchError {
    #[snafu(display("HTTP request failed: {source}"))]
    Http { source: reqwest::Error },
    #[snafu(display("Rate limited by the server"))]
    RateLimited,
    #[snafu(display("Unexpected response status: {status}"))]
    Status { status: StatusCode },
    #[snafu(display("Failed to decode followers page: {source}"))]
    Decode { source: serde_json::Error },
    #[snafu(display("Failed to encode query variables: {source}"))]
    Encode { source: serde_json::Error },
    #[snafu(display("Invalid endpoint url: {source}"))]
    Url { source: url::ParseError },
}

impl FetchError {
    /// Worth trying the same request again after a short backoff
    ///
    /// Rate limiting is not transient in this sense: it calls for a long
    /// cooldown instead.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http { .. } => true,
            FetchError::Status { status } => status.is_server_error(),
            FetchError::RateLimited
            | FetchError::Decode { .. }
            | FetchError::Encode { .. }
            | FetchError::Url { .. } => false,
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page after `cursor`, or the first page if `None`
    async fn fetch_page(&self, cursor: Option<&str>) -> FetchResult<Page>;
}

pub struct HttpPageFetcher {
    transport: Transport,
    target_id: String,
    page_size: u32,
}

impl HttpPageFetcher {
    pub fn new(transport: Transport, target_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            transport,
            target_id: target_id.into(),
            page_size,
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, cursor: Option<&str>) -> FetchResult<Page> {
        let variables = FollowersQueryVariables {
            id: &self.target_id,
            first: self.page_size,
            after: cursor.unwrap_or_default(),
        }
        .to_json()
        .context(EncodeSnafu)?;

        let url = self.transport.url(FOLLOWERS_QUERY_PATH).context(UrlSnafu)?;
        let request = self.transport.get(url).query(&[
            ("query_hash", FOLLOWERS_QUERY_HASH),
            ("variables", variables.as_str()),
        ]);

        let response = self.transport.send(request).await.context(HttpSnafu)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return RateLimitedSnafu.fail();
        }
        if !status.is_success() {
            return StatusSnafu { status }.fail();
        }

        let body = response.text().await.context(HttpSnafu)?;
        let page = Page::from(FollowersResponse::from_json(&body).context(DecodeSnafu)?);

        debug!(
            target: LOG_TARGET,
            users = page.users.len(),
            count = page.count,
            has_next_page = page.has_next_page,
            "Decoded followers page"
        );

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::FetchError;

    #[test]
    fn transient_errors() {
        assert!(
            FetchError::Status {
                status: StatusCode::BAD_GATEWAY
            }
            .is_transient()
        );
        assert!(
            !FetchError::Status {
                status: StatusCode::UNAUTHORIZED
            }
            .is_transient()
        );
        assert!(!FetchError::RateLimited.is_transient());

        let decode = serde_json::from_str::<u32>("nope").expect_err("not a number");
        assert!(!FetchError::Decode { source: decode }.is_transient());
    }
}
