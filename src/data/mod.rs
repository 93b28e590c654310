//! # Data Access
//!
//! Everything that touches the outside world lives here. Sources speak
//! `DataFault`; the `Boundary` translates those into `Failure` so nothing
//! above this module ever handles a raw fault.

pub mod boundary;
pub mod fault;
pub mod source;
pub mod sources;

pub use boundary::{Boundary, Repository, RetryPolicy};
pub use fault::DataFault;
pub use source::DataSource;
pub use sources::{FileSource, HttpSource, WriteThrough};
