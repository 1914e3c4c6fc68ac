pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod persistence;
pub mod timeline;

pub use error::{Result, TimelineError};
