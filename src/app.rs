//! # Composition Root
//!
//! Builds repositories, use cases, containers and the navigator once, from
//! a `ResolvedConfig`. Nothing else in the crate constructs these.

use std::sync::Arc;

use log::info;

use crate::core::config::ResolvedConfig;
use crate::core::container::{ContainerOptions, StateContainer};
use crate::core::failure::Failure;
use crate::core::strategy::Strategy;
use crate::core::use_case::Timeout;
use crate::data::{Boundary, FileSource, HttpSource, RetryPolicy, WriteThrough};
use crate::features::auth::{self, AppSnapshot, LoginUseCase, Screen, UserRecord, UserRepository};
use crate::navigation::{Decision, NavigationError, Navigator};

const USERS: &str = "users";

/// Where user records come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// HTTP API, with successful reads written through to the local cache.
    #[default]
    Online,
    /// Local cache only.
    Offline,
}

pub struct App {
    config: ResolvedConfig,
    pub auth: StateContainer<Timeout<LoginUseCase>>,
    pub navigator: Navigator<AppSnapshot, Screen>,
}

impl App {
    pub fn compose(config: ResolvedConfig, mode: Mode) -> Result<Self, Failure> {
        let cache = FileSource::<UserRecord>::new(config.cache_dir.join(USERS));

        let users: UserRepository = match mode {
            Mode::Online => {
                let http = HttpSource::<UserRecord>::new(&config.base_url, USERS, config.request_timeout)?;
                let retry = RetryPolicy::new(config.retry_attempts, config.retry_backoff);
                Arc::new(Boundary::new(WriteThrough::new(http, cache)).with_retry(retry))
            }
            Mode::Offline => Arc::new(Boundary::new(cache).with_retry(RetryPolicy::none())),
        };

        let login = Timeout::new(LoginUseCase::new(users), config.use_case_timeout);
        let auth = StateContainer::with_options(
            "auth",
            login,
            ContainerOptions::new(Strategy::Restartable).with_loading(config.emit_loading),
        );
        let navigator = auth::navigator()?.with_max_redirects(config.max_redirects);

        info!(
            "Composed app ({:?}, base_url={}, cache={})",
            mode,
            config.base_url,
            config.cache_dir.display()
        );

        Ok(Self {
            config,
            auth,
            navigator,
        })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Global state as guards see it right now.
    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot::from_auth(&self.auth.current_state())
    }

    pub fn resolve(&self, path: &str) -> Result<Decision, NavigationError> {
        self.navigator.resolve(path, &self.snapshot())
    }

    pub async fn shutdown(&self) {
        self.auth.teardown().await;
    }
}
