use std::fmt;

use serde::{Deserialize, Serialize};

/// How a container treats an event that arrives while another is in flight.
///
/// | Strategy      | Arrival while busy        | Emission order            |
/// |---------------|---------------------------|---------------------------|
/// | `Sequential`  | queued                    | dispatch order            |
/// | `Concurrent`  | started in parallel       | completion order (none promised) |
/// | `Droppable`   | discarded                 | only the in-flight result |
/// | `Restartable` | cancels in-flight, starts | only the newest result    |
///
/// Bound once per container; it cannot change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Sequential,
    /// Observers may see emissions out of dispatch order. No monotonicity.
    Concurrent,
    Droppable,
    Restartable,
}

impl Strategy {
    /// Whether teardown lets in-flight work finish instead of aborting it.
    pub fn drains_on_teardown(self) -> bool {
        matches!(self, Strategy::Concurrent)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strategy::Sequential => "sequential",
            Strategy::Concurrent => "concurrent",
            Strategy::Droppable => "droppable",
            Strategy::Restartable => "restartable",
        };
        f.write_str(label)
    }
}
