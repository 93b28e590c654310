//! # Features
//!
//! Each feature owns its use cases, the state its container emits, and the
//! guards that depend on that state.

pub mod auth;
