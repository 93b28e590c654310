//! # Auth Feature
//!
//! Login as a restartable state container, plus the guards that keep
//! signed-out users away from protected screens.
//!
//! ```text
//! LoginSubmitted(username) ──▶ LoginUseCase ──▶ UserRepository ──▶ State<Session>
//!                                                                     │
//!                                        AppSnapshot::from_auth ◀─────┘
//!                                                │
//!                                                ▼
//!                                 Navigator (require-auth, guest-only)
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

use crate::core::event::Event;
use crate::core::failure::{Failure, Outcome};
use crate::core::state::State;
use crate::core::use_case::UseCase;
use crate::data::boundary::Repository;
use crate::navigation::{GuardRule, Location, NavigationError, Navigator, RouteTable};

pub const LOGIN_SUBMITTED: &str = "LoginSubmitted";

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Routes that need a signed-in user.
const PROTECTED: [&str; 2] = [DASHBOARD_PATH, "/users/:id"];

// ============================================================================
// Data
// ============================================================================

/// User record as served by the user API and stored in the local cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub display_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

pub type UserRepository = Arc<dyn Repository<Request = String, Response = UserRecord>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signed in as {} ({})", self.display_name, self.user_id)
    }
}

pub fn login_submitted(username: impl Into<String>) -> Event<Credentials> {
    Event::new(
        LOGIN_SUBMITTED,
        Credentials {
            username: username.into(),
        },
    )
}

// ============================================================================
// Use Case
// ============================================================================

pub struct LoginUseCase {
    users: UserRepository,
}

impl LoginUseCase {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UseCase for LoginUseCase {
    type Input = Credentials;
    type Output = Session;

    fn name(&self) -> &str {
        "login"
    }

    async fn execute(&self, credentials: Credentials) -> Outcome<Session> {
        let username = credentials.username.trim();
        if username.is_empty() {
            return Err(Failure::unauthorized("empty username"));
        }

        let record = self.users.execute(username.to_string()).await?;
        if !record.active {
            return Err(Failure::unauthorized(format!("user '{}' is disabled", record.id)));
        }

        info!("User '{}' signed in", record.id);
        Ok(Session {
            user_id: record.id,
            display_name: record.display_name,
        })
    }
}

// ============================================================================
// Global snapshot & navigation
// ============================================================================

/// The slice of global state guards look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSnapshot {
    pub authenticated: bool,
    pub user_id: Option<String>,
}

impl AppSnapshot {
    pub fn from_auth(state: &State<Session>) -> Self {
        match state.data() {
            Some(session) => Self {
                authenticated: true,
                user_id: Some(session.user_id.clone()),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Login,
    Dashboard,
    Profile,
}

pub fn routes() -> Result<RouteTable<Screen>, NavigationError> {
    RouteTable::new()
        .route("/", &[], Screen::Home)?
        .route(LOGIN_PATH, &["next"], Screen::Login)?
        .route(DASHBOARD_PATH, &[], Screen::Dashboard)?
        .route("/users/:id", &["tab"], Screen::Profile)
}

pub fn navigator() -> Result<Navigator<AppSnapshot, Screen>, NavigationError> {
    Ok(Navigator::new(routes()?)
        .guard(GuardRule::new(
            "require-auth",
            0,
            |state: &AppSnapshot, location: &Location| {
                (!state.authenticated && PROTECTED.contains(&location.pattern()))
                    .then(|| LOGIN_PATH.to_string())
            },
        ))
        .guard(GuardRule::new(
            "guest-only",
            10,
            |state: &AppSnapshot, location: &Location| {
                (state.authenticated && location.path() == LOGIN_PATH)
                    .then(|| DASHBOARD_PATH.to_string())
            },
        )))
}
