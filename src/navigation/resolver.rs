//! # Navigation Resolver
//!
//! Given a requested path and the current global state snapshot, decide
//! whether navigation proceeds or is redirected.
//!
//! ```text
//! requested ──match──▶ Location ──guards (priority order)──▶ none fired ──▶ Allow
//!                          ▲                    │
//!                          └──── RedirectTo ◀───┘  (chain ≤ max_redirects,
//!                                                   no path visited twice)
//! ```
//!
//! A redirect target is resolved again against the same snapshot so guards
//! can chain. Visiting a path twice, or chaining more than `max_redirects`
//! times, is a configuration error reported as `RedirectLoop`.

use log::{debug, error, info};

use super::error::NavigationError;
use super::guard::GuardRule;
use super::route::{Location, RouteTable};

pub const DEFAULT_MAX_REDIRECTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Final target of the redirect chain.
    RedirectTo(String),
}

/// Outcome of `Navigator::navigate`: the decision plus where it lands.
pub struct Resolved<'a, H> {
    pub decision: Decision,
    pub handler: &'a H,
    pub location: Location,
}

pub struct Navigator<S, H> {
    routes: RouteTable<H>,
    guards: Vec<GuardRule<S>>,
    max_redirects: usize,
}

impl<S, H> Navigator<S, H> {
    pub fn new(routes: RouteTable<H>) -> Self {
        Self {
            routes,
            guards: Vec::new(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// Registers a guard, keeping evaluation order sorted by priority.
    pub fn guard(mut self, rule: GuardRule<S>) -> Self {
        self.guards.push(rule);
        // Stable sort keeps registration order among equal priorities.
        self.guards.sort_by_key(GuardRule::priority);
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn routes(&self) -> &RouteTable<H> {
        &self.routes
    }

    /// Guard names in evaluation order.
    pub fn guard_names(&self) -> Vec<&str> {
        self.guards.iter().map(GuardRule::name).collect()
    }

    pub fn resolve(&self, requested: &str, state: &S) -> Result<Decision, NavigationError> {
        self.navigate(requested, state).map(|resolved| resolved.decision)
    }

    /// Like `resolve`, but also returns the handler and parameters of the
    /// location navigation finally lands on.
    pub fn navigate(&self, requested: &str, state: &S) -> Result<Resolved<'_, H>, NavigationError> {
        let mut current = self.routes.match_path(requested)?;
        let mut chain = vec![current.location.href()];

        loop {
            let fired = self.guards.iter().find_map(|rule| {
                rule.check(state, &current.location)
                    .map(|target| (rule.name(), target))
            });
            let Some((rule, target)) = fired else {
                break;
            };

            let next = self.routes.match_path(&target)?;
            let href = next.location.href();
            let revisits = chain.contains(&href);
            chain.push(href);

            if revisits || chain.len() - 1 > self.max_redirects {
                error!("Redirect loop detected: {}", chain.join(" -> "));
                return Err(NavigationError::RedirectLoop { chain });
            }

            info!("Guard '{}' redirects {} -> {}", rule, current.location.href(), target);
            current = next;
        }

        let decision = if chain.len() == 1 {
            debug!("Navigation to {} allowed", requested);
            Decision::Allow
        } else {
            Decision::RedirectTo(current.location.href())
        };

        Ok(Resolved {
            decision,
            handler: current.handler,
            location: current.location,
        })
    }
}
