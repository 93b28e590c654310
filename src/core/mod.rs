//! # Core
//!
//! Feature state machines, independent of any presentation technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Event (input)        │
//!                    │  • State (output)       │
//!                    │  • UseCase (logic)      │
//!                    │  • StateContainer       │
//!                    │                         │
//!                    │  No UI. No formatting.  │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    Data    │      │ Navigation │      │Presentation│
//!     │ (boundary) │      │ (guards)   │      │ (messages) │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`failure`]: `Failure` and its `FailureKind` taxonomy
//! - [`event`]: The `Event` value dispatched into containers
//! - [`state`]: The `State` enum containers emit
//! - [`strategy`]: How overlapping events are handled
//! - [`use_case`]: The `UseCase` trait and `Timeout` wrapper
//! - [`container`]: `StateContainer` and its `Subscription` stream
//! - [`config`]: Settings loaded from `~/.waypoint/config.toml`

pub mod config;
pub mod container;
pub mod event;
pub mod failure;
pub mod state;
pub mod strategy;
pub mod use_case;

pub use container::{ContainerError, ContainerOptions, StateContainer, Subscription};
pub use event::Event;
pub use failure::{Failure, FailureKind, Outcome};
pub use state::State;
pub use strategy::Strategy;
pub use use_case::{Timeout, UseCase};
