//! Waypoint library exports for testing

pub mod app;
pub mod core;
pub mod data;
pub mod features;
pub mod navigation;
pub mod presentation;

#[cfg(test)]
pub mod test_support;
