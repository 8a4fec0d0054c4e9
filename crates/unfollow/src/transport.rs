use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore as _, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use snafu::{ResultExt as _, Snafu};
use tracing::debug;
use url::Url;

use crate::throttle::Throttle;

const LOG_TARGET: &str = "unfollow::transport";

pub const BASE_URL: &str = "https://www.instagram.com";
pub const DEFAULT_APP_ID: &str = "936619743392459";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

const HEADER_CSRF_TOKEN: &str = "x-csrftoken";
const HEADER_APP_ID: &str = "x-ig-app-id";
const HEADER_REQUESTED_WITH: &str = "x-requested-with";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransportError {
    #[snafu(display("Invalid value for header {name}"))]
    InvalidHeader {
        name: HeaderName,
        source: InvalidHeaderValue,
    },
    #[snafu(display("Session cookie contains no cookies"))]
    EmptyCookie,
    #[snafu(display("Invalid base url: {source}"))]
    BaseUrl { source: url::ParseError },
    #[snafu(display("HTTP client initialization failed: {source}"))]
    Init { source: reqwest::Error },
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Credentials of an already logged-in browser session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Raw `Cookie` header value, `name=value` pairs separated by `;`
    pub cookie: String,
    pub csrf_token: Option<String>,
    pub app_id: String,
    pub user_agent: String,
}

impl SessionConfig {
    fn default_headers(&self) -> TransportResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        insert_sensitive(
            &mut headers,
            HeaderName::from_static(HEADER_APP_ID),
            &self.app_id,
        )?;
        headers.insert(
            HeaderName::from_static(HEADER_REQUESTED_WITH),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if let Some(csrf_token) = self.csrf_token.as_deref() {
            insert_sensitive(
                &mut headers,
                HeaderName::from_static(HEADER_CSRF_TOKEN),
                csrf_token,
            )?;
        }

        Ok(headers)
    }

    /// Jar seeded with the session cookies
    ///
    /// `Set-Cookie` responses update it, so rotated tokens are picked up.
    fn cookie_jar(&self, base_url: &Url) -> TransportResult<Jar> {
        let jar = Jar::default();
        for pair in self.cookie.split(';').map(str::trim) {
            if !pair.is_empty() {
                jar.add_cookie_str(&format!("{pair}; Path=/"), base_url);
            }
        }

        if jar.cookies(base_url).is_none() {
            return EmptyCookieSnafu.fail();
        }
        Ok(jar)
    }
}

fn insert_sensitive(
    headers: &mut HeaderMap,
    name: HeaderName,
    value: &str,
) -> TransportResult<()> {
    let mut value = HeaderValue::from_str(value).context(InvalidHeaderSnafu {
        name: name.clone(),
    })?;
    value.set_sensitive(true);
    headers.insert(name, value);
    Ok(())
}

/// Authenticated HTTP client bound to a single origin
///
/// Every request goes through [`Throttle::wait`] first. Certificate
/// verification is turned off and redirects are not followed, so an expired
/// session shows up as a non-2xx status.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: Url,
    throttle: Throttle,
}

impl Transport {
    pub fn new(
        base_url: &str,
        session: &SessionConfig,
        throttle: Throttle,
        request_timeout: Duration,
    ) -> TransportResult<Self> {
        let base_url = Url::parse(base_url).context(BaseUrlSnafu)?;

        let client = Client::builder()
            .user_agent(session.user_agent.as_str())
            .default_headers(session.default_headers()?)
            .cookie_provider(Arc::new(session.cookie_jar(&base_url)?))
            .danger_accept_invalid_certs(true)
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(request_timeout)
            .build()
            .context(InitSnafu)?;

        Ok(Self {
            client,
            base_url,
            throttle,
        })
    }

    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: Url) -> RequestBuilder {
        self.client.post(url)
    }

    /// Wait for the throttle, then send
    pub async fn send(&self, request: RequestBuilder) -> reqwest::Result<Response> {
        self.throttle.wait().await;
        let response = request.send().await?;
        debug!(target: LOG_TARGET, url = %response.url(), status = %response.status(), "Response");
        Ok(response)
    }
}
