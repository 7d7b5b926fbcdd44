//! # covid-figs graphs
//!
//! Fetches the upstream feeds into [`DataTable`]s, derives daily series and
//! growth factors from them, and renders the charts of one series
//! ([`TimeSeriesViz`]) or the overview grid of one area ([`OverviewViz`]).
//!
//! Drawing is generic over the plotters backend; files are written as PNG.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod charts;
pub mod data_fetcher;
pub mod export;
pub mod layout;
pub mod overview;
pub mod renderer;
pub mod series;
pub mod table;
pub mod time_series;

pub use charts::{GrowthChart, GrowthFactorOptions, GrowthLine, NewCasesChart, SeriesChart};
pub use data_fetcher::{DataFetcher, DataSet};
pub use export::{load_series_csv, OutputPair};
pub use overview::{Metric, OverviewOptions, OverviewViz, METRICS};
pub use renderer::{ChartRenderer, ChartStyle};
pub use series::{GrowthSeries, NamedSeries};
pub use table::{DataTable, TableOptions, TableRow};
pub use time_series::{SaveOptions, SavedOutputs, TimeSeriesViz};
