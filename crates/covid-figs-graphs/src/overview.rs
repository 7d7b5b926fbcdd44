//! Three-by-three overview of one geographic area.
//!
//! Rows are total cases, deaths and intensive care; columns are the
//! cumulative series, the daily new cases and the growth factor.

use crate::charts::GrowthFactorOptions;
use crate::export::OutputPair;
use crate::renderer::{split_title, ChartRenderer, ChartStyle};
use crate::table::DataTable;
use crate::time_series::{SaveOptions, TimeSeriesViz, DEFAULT_FIGURE_SIZE};
use covid_figs_common::{format_update_line, FigsError, LastModified, Result};
use covid_figs_config::ChartsConfig;
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use std::path::PathBuf;
use tracing::{debug, info};

/// One row of the overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    /// Source column.
    pub column: &'static str,
    /// Series name prefix, followed by the area name.
    pub series_prefix: &'static str,
    /// Words inserted into the chart titles; empty for total cases.
    pub title_fragment: &'static str,
}

pub const METRICS: [Metric; 3] = [
    Metric {
        column: "totale_casi",
        series_prefix: "totali",
        title_fragment: "",
    },
    Metric {
        column: "deceduti",
        series_prefix: "deceduti",
        title_fragment: "deceduti",
    },
    Metric {
        column: "terapia_intensiva",
        series_prefix: "terapia intensiva",
        title_fragment: "in terapia intensiva",
    },
];

impl Metric {
    pub fn series_name(&self, area: &str) -> String {
        format!("{} {area}", self.series_prefix)
    }

    /// `{lead} {fragment} in {area}`, without a double space when the fragment is empty.
    fn title(&self, lead: &str, area: &str) -> String {
        if self.title_fragment.is_empty() {
            format!("{lead} in {area}")
        } else {
            format!("{lead} {} in {area}", self.title_fragment)
        }
    }

    pub fn series_title(&self, area: &str) -> String {
        self.title("Casi", area)
    }

    pub fn new_cases_title(&self, area: &str) -> String {
        self.title("Nuovi casi giornalieri", area)
    }

    pub fn growth_title(&self, area: &str) -> String {
        self.title("Tasso di crescita dei casi", area)
    }
}

/// Size and growth parameters of an overview.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewOptions {
    /// Pixel size of the whole grid.
    pub size: (u32, u32),
    /// Pixel size of a standalone chart of one row.
    pub figure_size: (u32, u32),
    pub growth: GrowthFactorOptions,
}

impl Default for OverviewOptions {
    fn default() -> Self {
        Self {
            size: (2000, 1600),
            figure_size: DEFAULT_FIGURE_SIZE,
            growth: GrowthFactorOptions::overview(),
        }
    }
}

impl From<&ChartsConfig> for OverviewOptions {
    fn from(config: &ChartsConfig) -> Self {
        Self {
            size: (config.overview_width, config.overview_height),
            figure_size: (config.figure_width, config.figure_height),
            growth: GrowthFactorOptions {
                lookback: config.lookback,
                window: config.window,
                span: config.span,
                y_limit: config.growth_y_limit.map(|[lo, hi]| (lo, hi)),
                ..GrowthFactorOptions::overview()
            },
        }
    }
}

/// Overview grid for one area.
#[derive(Debug, Clone)]
pub struct OverviewViz {
    area_name: String,
    rows: Vec<(Metric, TimeSeriesViz)>,
    last_modified: Option<LastModified>,
    fig_folder: Option<PathBuf>,
    options: OverviewOptions,
    style: ChartStyle,
}

impl OverviewViz {
    /// Build the three metric series of `table`, resampled to one value per day.
    pub fn new(
        area_name: impl Into<String>,
        table: &DataTable,
        last_modified: Option<LastModified>,
        options: OverviewOptions,
    ) -> Result<Self> {
        let area_name = area_name.into();
        options.growth.validate()?;

        let rows = METRICS
            .iter()
            .map(|metric| {
                let series = table.daily_series(metric.column, metric.series_name(&area_name))?;
                debug!(
                    series = series.name(),
                    days = series.len(),
                    "Prepared overview series"
                );
                Ok((
                    *metric,
                    TimeSeriesViz::new(series).with_size(options.figure_size),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            area_name,
            rows,
            last_modified,
            fig_folder: None,
            options,
            style: ChartStyle::default(),
        })
    }

    #[must_use]
    pub fn with_fig_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.fig_folder = Some(folder.into());
        self
    }

    /// Folder of the per-metric CSV snapshots.
    #[must_use]
    pub fn with_csv_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        let folder = folder.into();
        self.rows = self
            .rows
            .into_iter()
            .map(|(metric, viz)| (metric, viz.with_csv_folder(folder.clone())))
            .collect();
        self
    }

    pub fn area_name(&self) -> &str {
        &self.area_name
    }

    pub fn rows(&self) -> &[(Metric, TimeSeriesViz)] {
        &self.rows
    }

    pub fn options(&self) -> &OverviewOptions {
        &self.options
    }

    /// Super-title lines of the grid.
    pub fn super_title(&self) -> Vec<String> {
        let mut lines = vec![format!("Situazione COVID-19 in {}", self.area_name)];
        if let Some(last_modified) = &self.last_modified {
            lines.push(format_update_line(last_modified));
        }
        lines
    }

    fn output(&self) -> Result<OutputPair> {
        let date = self
            .last_modified
            .as_ref()
            .map(|ts| ts.date_naive())
            .or_else(|| {
                self.rows
                    .iter()
                    .filter_map(|(_, viz)| viz.series().last_date())
                    .max()
            })
            .ok_or_else(|| {
                FigsError::validation(format!("No data to render for {}", self.area_name))
            })?;
        Ok(OutputPair::new(
            self.fig_folder.as_deref(),
            &self.area_name,
            "overview",
            date,
            "png",
        ))
    }

    /// Render the grid to `{area}-overview-{date}.png` and copy it to `{area}-overview.png`.
    pub fn save_overview(&self) -> Result<OutputPair> {
        let pair = self.output()?;
        self.render_to_file(&pair.dated, self.options.size)?;
        pair.promote()?;
        info!(
            "Figure saved to {} and {}",
            pair.dated.display(),
            pair.latest.display()
        );
        Ok(pair)
    }

    /// Render the standalone series, new-cases and growth charts of every row.
    pub fn save_figures(&self) -> Result<Vec<OutputPair>> {
        let mut pairs = Vec::new();
        for (metric, viz) in &self.rows {
            let viz = viz.clone().with_last_modified(self.last_modified);
            let viz = match &self.fig_folder {
                Some(folder) => viz.with_fig_folder(folder.clone()),
                None => viz,
            };
            let area = &self.area_name;
            pairs.extend(viz.save_series(&metric.series_title(area), SaveOptions::FIGURE)?.figure);
            pairs.extend(viz.save_new(&metric.new_cases_title(area), SaveOptions::FIGURE)?.figure);
            pairs.extend(
                viz.save_growth_factor(
                    &metric.growth_title(area),
                    &self.options.growth,
                    SaveOptions::FIGURE,
                )?
                .figure,
            );
        }
        Ok(pairs)
    }

    /// Write the series, new-cases and growth CSV snapshots of every row.
    pub fn save_csv_snapshots(&self) -> Result<Vec<OutputPair>> {
        let csv_only = SaveOptions {
            figure: false,
            csv: true,
        };
        let mut pairs = Vec::new();
        for (metric, viz) in &self.rows {
            let viz = viz.clone().with_last_modified(self.last_modified);
            let area = &self.area_name;
            pairs.extend(viz.save_series(&metric.series_title(area), csv_only)?.csv);
            pairs.extend(viz.save_new(&metric.new_cases_title(area), csv_only)?.csv);
            pairs.extend(
                viz.save_growth_factor(&metric.growth_title(area), &self.options.growth, csv_only)?
                    .csv,
            );
        }
        Ok(pairs)
    }
}

impl ChartRenderer for OverviewViz {
    fn draw_on<DB>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        let body = split_title(
            area,
            &self.super_title(),
            self.style.super_title_size,
            &self.style,
        )?;
        let panels = body.split_evenly((METRICS.len(), 3));
        let name = &self.area_name;

        for ((metric, viz), row) in self.rows.iter().zip(panels.chunks(3)) {
            viz.draw_series(&row[0], &metric.series_title(name))?;
            viz.draw_new(&row[1], &metric.new_cases_title(name))?;
            viz.draw_growth_factor(&row[2], &metric.growth_title(name), &self.options.growth)?;
        }
        Ok(())
    }
}
