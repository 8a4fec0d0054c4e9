pub mod config;
pub mod fetcher;
pub mod orchestrator;
pub mod remover;
pub mod throttle;
pub mod transport;

pub const LOG_TARGET: &str = "unfollow::main";

/// Account whose followers are enumerated
pub const TARGET_USER_ID: &str = "7816750562";
