use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};
use unfollow_core::{Outcome, User};

use crate::transport::Transport;

const LOG_TARGET: &str = "unfollow::remover";

#[async_trait::async_trait]
pub trait FollowerRemover: Send + Sync {
    /// Try to remove `user` from the owner's followers
    ///
    /// Never fails: every problem is folded into an [`Outcome`].
    async fn remove_follower(&self, user: &User) -> Outcome;
}

/// Map the response status of a removal request
pub fn classify_status(status: StatusCode) -> Outcome {
    if status.is_success() {
        Outcome::Success
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Outcome::RetryRateLimited
    } else {
        Outcome::PermanentFailure
    }
}

pub struct HttpFollowerRemover {
    transport: Transport,
}

impl HttpFollowerRemover {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl FollowerRemover for HttpFollowerRemover {
    async fn remove_follower(&self, user: &User) -> Outcome {
        let path = format!("/api/v1/web/friendships/{}/remove_follower/", user.id);
        let url = match self.transport.url(&path) {
            Ok(url) => url,
            Err(err) => {
                warn!(target: LOG_TARGET, user_id = %user.id, err = %err, "Invalid removal url");
                return Outcome::PermanentFailure;
            }
        };

        let request = self
            .transport
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("");

        match self.transport.send(request).await {
            Ok(response) => {
                let status = response.status();
                let outcome = classify_status(status);
                if outcome == Outcome::PermanentFailure {
                    warn!(target: LOG_TARGET, user_id = %user.id, status = %status, "Removal rejected");
                } else {
                    debug!(target: LOG_TARGET, user_id = %user.id, status = %status, "Removal response");
                }
                outcome
            }
            Err(err) => {
                warn!(
                    target: LOG_TARGET,
                    user_id = %user.id,
                    err = %err,
                    timeout = err.is_timeout(),
                    "Removal request failed"
                );
                Outcome::PermanentFailure
            }
        }
    }
}
