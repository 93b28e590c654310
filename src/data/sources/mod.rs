pub mod file;
pub mod http;

pub use file::{FileSource, WriteThrough};
pub use http::HttpSource;
