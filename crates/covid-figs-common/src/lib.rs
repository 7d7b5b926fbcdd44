//! # covid-figs common
//!
//! Shared error type, logging sink, upstream repository client and naming
//! utilities used by every crate in the covid-figs workspace.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod repository;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

// Re-export commonly used types
pub use error::{FigsError, Result};
pub use logging::{build_dispatch, LogFormat, LoggingConfig};
pub use repository::{RepositoryClient, RepositoryConfig};
pub use types::*;
pub use utils::*;
