//! # Navigation
//!
//! Guard-based redirect resolution. The navigator never talks to
//! containers: callers hand it a snapshot of global state and a path.

pub mod error;
pub mod guard;
pub mod resolver;
pub mod route;

pub use error::NavigationError;
pub use guard::{Guard, GuardRule};
pub use resolver::{Decision, Navigator, Resolved};
pub use route::{Location, RouteMatch, RoutePattern, RouteTable};
