//! # covid-figs config
//!
//! Typed run configuration: loaded once from YAML and the environment,
//! validated at the boundary, then passed explicitly into the job.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::*;
pub use schema::*;
pub use validator::*;
