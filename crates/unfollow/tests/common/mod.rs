use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use unfollow::config::RunConfig;
use unfollow::fetcher::{FetchResult, PageFetcher};
use unfollow::remover::FollowerRemover;
use unfollow_core::{Outcome, Page, User, UserId};

/// Config with every delay set to zero
pub fn instant_config() -> RunConfig {
    RunConfig {
        throttle_min: Duration::ZERO,
        throttle_max: Duration::ZERO,
        cooldown: Duration::ZERO,
        fetch_retry_delay: Duration::ZERO,
        ..RunConfig::default()
    }
}

/// A follower the owner does not follow back
pub fn follower(id: &str) -> User {
    User {
        id: UserId::from(id),
        username: format!("user_{id}"),
        full_name: format!("User {id}"),
        profile_pic_url: format!("https://cdn.example/{id}.jpg"),
        is_private: false,
        is_verified: false,
        followed_by_viewer: false,
        follows_viewer: true,
        requested_by_viewer: false,
    }
}

/// A follower the owner follows back
pub fn mutual(id: &str) -> User {
    User {
        followed_by_viewer: true,
        ..follower(id)
    }
}

pub fn page(users: Vec<User>, next_cursor: Option<&str>) -> Page {
    Page {
        count: 100,
        has_next_page: next_cursor.is_some(),
        end_cursor: next_cursor.map(ToOwned::to_owned),
        users,
    }
}

pub fn ids(users: &[User]) -> Vec<&str> {
    users.iter().map(|u| u.id.as_str()).collect()
}

/// Serves scripted responses in order, recording the cursors asked for
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<VecDeque<FetchResult<Page>>>>,
    cursors: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockFetcher {
    pub fn new(responses: impl IntoIterator<Item = FetchResult<Page>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
            cursors: Arc::default(),
        }
    }

    pub async fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().await.clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_page(&self, cursor: Option<&str>) -> FetchResult<Page> {
        self.cursors.lock().await.push(cursor.map(ToOwned::to_owned));
        self.responses
            .lock()
            .await
            .pop_front()
            .expect("no more scripted pages")
    }
}

/// Removes everyone successfully, unless scripted otherwise per user
#[derive(Clone, Default)]
pub struct MockRemover {
    scripted: Arc<Mutex<HashMap<UserId, VecDeque<Outcome>>>>,
    calls: Arc<Mutex<Vec<UserId>>>,
    always: Option<Outcome>,
}

impl MockRemover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call returns `outcome`
    pub fn always(outcome: Outcome) -> Self {
        Self {
            always: Some(outcome),
            ..Self::default()
        }
    }

    /// Upcoming outcomes for `id`; [`Outcome::Success`] once they run out
    pub async fn script(&self, id: &str, outcomes: impl IntoIterator<Item = Outcome>) {
        self.scripted
            .lock()
            .await
            .insert(UserId::from(id), outcomes.into_iter().collect());
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|id| id.to_string())
            .collect()
    }
}

#[async_trait]
impl FollowerRemover for MockRemover {
    async fn remove_follower(&self, user: &User) -> Outcome {
        self.calls.lock().await.push(user.id.clone());

        if let Some(outcome) = self.always {
            return outcome;
        }

        self.scripted
            .lock()
            .await
            .get_mut(&user.id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Outcome::Success)
    }
}
