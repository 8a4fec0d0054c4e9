//! Pagination and removal loop
//!
//! The run is a small state machine driven one step at a time:
//!
//! * [`State::FetchingPage`] fetches the page after the stored cursor and
//!   appends its followers to the pending queue.
//! * [`State::DrainingQueue`] takes the follower at the front of the queue and
//!   tries to remove it. A rate-limited follower goes back to the front.
//! * [`State::Cooldown`] waits out a rate limit signal.
//! * [`State::Done`] is terminal.
//!
//! Only one request is ever in flight.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::future::Future;

use backon::{FibonacciBuilder, Retryable as _};
use snafu::{ResultExt as _, Snafu};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use unfollow_core::{Outcome, Page, PageError, ProcessStatus, RunStatus, User, UserId};

use crate::config::RunConfig;
use crate::fetcher::{FetchError, FetchResult, PageFetcher};
use crate::remover::FollowerRemover;

const LOG_TARGET: &str = "unfollow::orchestrator";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RunError {
    #[snafu(display(
        "Failed to fetch followers page (cursor: {}): {source}",
        cursor.as_deref().unwrap_or("-")
    ))]
    FetchPage {
        source: FetchError,
        cursor: Option<String>,
    },
    #[snafu(display("Invalid followers page: {source}"))]
    InvalidPage { source: PageError },
    #[snafu(display("Server returned the same cursor again: {cursor}"))]
    StalledPagination { cursor: String },
}

pub type RunResult<T> = std::result::Result<T, RunError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    FetchingPage,
    DrainingQueue,
    Cooldown,
    Done,
}

/// Why a follower was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The owner follows them back
    FollowedBack,
    /// They no longer follow the owner
    NotFollowing,
    /// The owner asked to follow them
    FollowRequested,
}

impl SkipReason {
    pub fn of(user: &User, spare_requested: bool) -> Option<Self> {
        if user.followed_by_viewer {
            Some(Self::FollowedBack)
        } else if !user.follows_viewer {
            Some(Self::NotFollowing)
        } else if spare_requested && user.requested_by_viewer {
            Some(Self::FollowRequested)
        } else {
            None
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::FollowedBack => "followed back",
            SkipReason::NotFollowing => "not following",
            SkipReason::FollowRequested => "follow requested",
        })
    }
}

/// Everything a run knows, owned in one place
#[derive(Debug)]
pub struct RunState {
    queue: VecDeque<User>,
    /// Cursor of the next page to fetch; `None` before the first page
    cursor: Option<String>,
    /// Pagination not exhausted yet
    has_next_page: bool,
    seen: HashSet<UserId>,
    status: ProcessStatus,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            cursor: None,
            has_next_page: true,
            seen: HashSet::new(),
            status: ProcessStatus::new(),
        }
    }
}

impl RunState {
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn status(&self) -> &ProcessStatus {
        &self.status
    }

    /// Append followers of `page` to the queue, returning how many were new
    fn enqueue_page(&mut self, page: Page) -> RunResult<usize> {
        let next_cursor = page
            .next_cursor()
            .context(InvalidPageSnafu)?
            .map(ToOwned::to_owned);

        if let Some(next_cursor) = next_cursor.as_deref() {
            if self.cursor.as_deref() == Some(next_cursor) {
                return StalledPaginationSnafu { cursor: next_cursor }.fail();
            }
        }

        self.status.record_page(page.count);
        self.has_next_page = next_cursor.is_some();
        self.cursor = next_cursor;

        let mut added = 0;
        for user in page.users {
            if self.seen.insert(user.id.clone()) {
                self.queue.push_back(user);
                added += 1;
            } else {
                debug!(target: LOG_TARGET, user_id = %user.id, "Follower listed twice, ignoring");
            }
        }
        Ok(added)
    }
}

pub struct Orchestrator<F, R> {
    fetcher: F,
    remover: R,
    config: RunConfig,
    shutdown: watch::Receiver<bool>,
    state: RunState,
}

impl<F, R> Orchestrator<F, R>
where
    F: PageFetcher,
    R: FollowerRemover,
{
    pub fn new(fetcher: F, remover: R, config: RunConfig) -> Self {
        // Sender dropped right away: never signals
        let (_, shutdown) = watch::channel(false);
        Self {
            fetcher,
            remover,
            config,
            shutdown,
            state: RunState::default(),
        }
    }

    /// Stop the run as soon as `true` is sent
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn status(&self) -> &ProcessStatus {
        &self.state.status
    }

    pub fn into_status(self) -> ProcessStatus {
        self.state.status
    }

    /// Drive the run until [`State::Done`]
    ///
    /// On error the status is left as [`RunStatus::Failed`], with everything
    /// done so far still available through [`Self::status`].
    pub async fn run(&mut self) -> RunResult<()> {
        let mut state = State::FetchingPage;
        while state != State::Done {
            state = self.step(state).await.inspect_err(|err| {
                error!(target: LOG_TARGET, err = %err, "Run aborted");
            })?;
        }

        info!(target: LOG_TARGET, status = %self.state.status, "Done!");
        Ok(())
    }

    pub async fn step(&mut self, state: State) -> RunResult<State> {
        let next = match state {
            State::FetchingPage => match self.fetch_next_page().await {
                Ok(next) => next,
                Err(err) => {
                    self.state.status.finish(RunStatus::Failed);
                    return Err(err);
                }
            },
            State::DrainingQueue => self.drain_one().await,
            State::Cooldown => self.cool_down().await,
            State::Done => State::Done,
        };

        if next == State::Done && !self.state.status.status().is_terminal() {
            self.state.status.finish(RunStatus::Completed);
        }

        Ok(next)
    }

    async fn fetch_next_page(&mut self) -> RunResult<State> {
        let cursor = self.state.cursor.clone();
        debug!(target: LOG_TARGET, cursor = cursor.as_deref().unwrap_or("-"), "Fetching followers page");

        let fetched = until_shutdown(
            &mut self.shutdown,
            fetch_with_retry(&self.fetcher, cursor.as_deref(), &self.config),
        )
        .await;

        let page = match fetched {
            None => return Ok(self.interrupt()),
            Some(Ok(page)) => page,
            Some(Err(FetchError::RateLimited)) => {
                warn!(target: LOG_TARGET, "Rate limited while fetching followers");
                self.state.status.record_rate_limited();
                return Ok(State::Cooldown);
            }
            Some(Err(source)) => return Err(RunError::FetchPage { source, cursor }),
        };

        let added = self.state.enqueue_page(page)?;
        info!(
            target: LOG_TARGET,
            added,
            pending = self.state.queue.len(),
            total_followers = self.state.status.total_followers(),
            has_next_page = self.state.has_next_page,
            "Fetched followers page"
        );

        Ok(State::DrainingQueue)
    }

    async fn drain_one(&mut self) -> State {
        if let Some(max_removals) = self.config.max_removals {
            if max_removals <= self.state.status.count_unfollowed() {
                info!(target: LOG_TARGET, max_removals, "Removal limit reached");
                return State::Done;
            }
        }

        let Some(user) = self.state.queue.pop_front() else {
            if self.state.has_next_page {
                info!(target: LOG_TARGET, "No more users in the queue, fetching next page");
                return State::FetchingPage;
            }
            info!(target: LOG_TARGET, "All followers processed");
            return State::Done;
        };

        if let Some(reason) = SkipReason::of(&user, self.config.spare_requested) {
            debug!(target: LOG_TARGET, user = %user, %reason, "Skipping follower");
            self.state.status.record_skipped();
            return State::DrainingQueue;
        }

        info!(target: LOG_TARGET, user = %user, "Removing follower");
        let Some(outcome) =
            until_shutdown(&mut self.shutdown, self.remover.remove_follower(&user)).await
        else {
            self.state.queue.push_front(user);
            return self.interrupt();
        };

        match outcome {
            Outcome::Success => {
                info!(
                    target: LOG_TARGET,
                    count = self.state.status.count_unfollowed() + 1,
                    user = %user,
                    "Removed follower"
                );
                self.state.status.record_unfollowed(user);
                State::DrainingQueue
            }
            Outcome::RetryRateLimited => {
                warn!(target: LOG_TARGET, user = %user, "Rate limit exceeded");
                self.state.status.record_rate_limited();
                self.state.queue.push_front(user);
                State::Cooldown
            }
            Outcome::PermanentFailure => {
                warn!(target: LOG_TARGET, user = %user, "Failed to remove follower");
                self.state.status.record_failed();
                State::DrainingQueue
            }
        }
    }

    async fn cool_down(&mut self) -> State {
        info!(
            target: LOG_TARGET,
            cooldown_secs = self.config.cooldown.as_secs(),
            "Waiting before retrying"
        );

        match until_shutdown(&mut self.shutdown, tokio::time::sleep(self.config.cooldown)).await {
            Some(()) => State::DrainingQueue,
            None => self.interrupt(),
        }
    }

    fn interrupt(&mut self) -> State {
        warn!(target: LOG_TARGET, pending = self.state.queue.len(), "Shutdown requested, stopping");
        self.state.status.finish(RunStatus::Interrupted);
        State::Done
    }
}

async fn fetch_with_retry<F>(
    fetcher: &F,
    cursor: Option<&str>,
    config: &RunConfig,
) -> FetchResult<Page>
where
    F: PageFetcher,
{
    (|| async move { fetcher.fetch_page(cursor).await })
        .retry(
            FibonacciBuilder::default()
                .with_min_delay(config.fetch_retry_delay)
                .with_max_delay(config.cooldown.max(config.fetch_retry_delay))
                .with_max_times(config.fetch_attempts.saturating_sub(1))
                .with_jitter(),
        )
        .when(FetchError::is_transient)
        .notify(|err, delay| {
            warn!(
                target: LOG_TARGET,
                err = %err,
                retry_in_secs = delay.as_secs(),
                "Followers page fetch failed, retrying"
            );
        })
        .await
}

/// `None` if shutdown was requested before `fut` completed
async fn until_shutdown<T>(
    shutdown: &mut watch::Receiver<bool>,
    fut: impl Future<Output = T>,
) -> Option<T> {
    tokio::select! {
        biased;
        () = shutdown_requested(shutdown) => None,
        res = fut => Some(res),
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
