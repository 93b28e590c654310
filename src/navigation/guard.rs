use super::route::Location;

/// Decides whether navigating to `location` should be redirected.
///
/// Guards must be pure functions of the global state snapshot and the
/// location: no I/O and no memory of earlier calls. Returning `Some(path)`
/// redirects there; `None` lets the next guard decide.
pub trait Guard<S>: Send + Sync {
    fn check(&self, state: &S, location: &Location) -> Option<String>;
}

impl<S, F> Guard<S> for F
where
    F: Fn(&S, &Location) -> Option<String> + Send + Sync,
{
    fn check(&self, state: &S, location: &Location) -> Option<String> {
        self(state, location)
    }
}

/// A named guard with an evaluation priority. Lower priorities run first;
/// equal priorities run in registration order.
pub struct GuardRule<S> {
    name: String,
    priority: i32,
    guard: Box<dyn Guard<S>>,
}

impl<S> GuardRule<S> {
    pub fn new(name: impl Into<String>, priority: i32, guard: impl Guard<S> + 'static) -> Self {
        Self {
            name: name.into(),
            priority,
            guard: Box::new(guard),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn check(&self, state: &S, location: &Location) -> Option<String> {
        self.guard.check(state, location)
    }
}
