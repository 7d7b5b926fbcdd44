//! # covid-figs
//!
//! Fetches the Italian COVID-19 feeds, renders an overview per configured
//! area and publishes the figures to S3. The `covid-figs` binary runs
//! [`run_job`] once and prints the [`RunReport`] as JSON.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod pipeline;
pub mod publisher;
pub mod report;

pub use pipeline::{
    fetch_feeds, prepare_area, prepare_areas, publish_rendered, render_area, run_job,
    PreparedArea, RenderedArea, REGION_COLUMN,
};
pub use publisher::{content_type_for, ObjectPublisher, S3Publisher, StoredObject};
pub use report::{AreaReport, RunReport};
