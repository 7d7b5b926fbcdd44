//! Standalone charts of one series: cumulative, new cases and growth factor.

use crate::charts::{GrowthChart, GrowthFactorOptions, NewCasesChart, SeriesChart};
use crate::export::{self, OutputPair};
use crate::renderer::{ChartRenderer, ChartStyle};
use crate::series::NamedSeries;
use chrono::NaiveDate;
use covid_figs_common::{format_update_line, FigsError, LastModified, Result};
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default size of a standalone chart, in pixels.
pub const DEFAULT_FIGURE_SIZE: (u32, u32) = (1600, 1000);

/// Which files a `save_*` call writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOptions {
    pub figure: bool,
    pub csv: bool,
}

impl SaveOptions {
    pub const FIGURE: Self = Self {
        figure: true,
        csv: false,
    };
    pub const ALL: Self = Self {
        figure: true,
        csv: true,
    };
}

/// Files written by a `save_*` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedOutputs {
    pub figure: Option<OutputPair>,
    pub csv: Option<OutputPair>,
}

/// Charts of a single named series.
#[derive(Debug, Clone)]
pub struct TimeSeriesViz {
    series: NamedSeries,
    last_modified: Option<LastModified>,
    fig_folder: Option<PathBuf>,
    csv_folder: Option<PathBuf>,
    size: (u32, u32),
    style: ChartStyle,
}

impl TimeSeriesViz {
    pub fn new(series: NamedSeries) -> Self {
        Self {
            series,
            last_modified: None,
            fig_folder: None,
            csv_folder: None,
            size: DEFAULT_FIGURE_SIZE,
            style: ChartStyle::default(),
        }
    }

    /// Attach the upstream modification time shown under titles and used in file names.
    #[must_use]
    pub fn with_last_modified(mut self, last_modified: Option<LastModified>) -> Self {
        self.last_modified = last_modified;
        self
    }

    #[must_use]
    pub fn with_fig_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.fig_folder = Some(folder.into());
        self
    }

    #[must_use]
    pub fn with_csv_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.csv_folder = Some(folder.into());
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: (u32, u32)) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    pub fn series(&self) -> &NamedSeries {
        &self.series
    }

    /// Pixel size of saved standalone charts.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn last_modified(&self) -> Option<&LastModified> {
        self.last_modified.as_ref()
    }

    /// Day-over-day difference of the series.
    pub fn diff(&self) -> NamedSeries {
        self.series.diff()
    }

    /// `title`, followed by the update line when a modification time is attached.
    pub fn title_lines(&self, title: &str) -> Vec<String> {
        let mut lines = vec![title.to_string()];
        if let Some(last_modified) = &self.last_modified {
            lines.push(format_update_line(last_modified));
        }
        lines
    }

    pub fn series_chart(&self, title: &str) -> SeriesChart {
        SeriesChart::new(self.series.clone(), self.title_lines(title), self.style.clone())
    }

    pub fn new_cases_chart(&self, title: &str) -> NewCasesChart {
        NewCasesChart::new(&self.series, self.title_lines(title), self.style.clone())
    }

    pub fn growth_chart(&self, title: &str, options: &GrowthFactorOptions) -> Result<GrowthChart> {
        GrowthChart::new(
            &self.series,
            self.title_lines(title),
            options.clone(),
            self.style.clone(),
        )
    }

    /// Draw the cumulative line chart into `area`.
    pub fn draw_series<DB>(&self, area: &DrawingArea<DB, Shift>, title: &str) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        self.series_chart(title).draw_on(area)
    }

    /// Draw the new-cases bar chart into `area`.
    pub fn draw_new<DB>(&self, area: &DrawingArea<DB, Shift>, title: &str) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        self.new_cases_chart(title).draw_on(area)
    }

    /// Draw the growth-factor chart into `area`.
    pub fn draw_growth_factor<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        title: &str,
        options: &GrowthFactorOptions,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        self.growth_chart(title, options)?.draw_on(area)
    }

    /// Date stamped into file names: the modification day, else the last day of data.
    pub fn file_date(&self) -> Result<NaiveDate> {
        self.last_modified
            .as_ref()
            .map(|ts| ts.date_naive())
            .or_else(|| self.series.last_date())
            .ok_or_else(|| {
                FigsError::validation(format!(
                    "Series '{}' is empty and has no modification time",
                    self.series.name()
                ))
            })
    }

    fn output(&self, folder: Option<&Path>, kind: &str, ext: &str) -> Result<OutputPair> {
        Ok(OutputPair::new(
            folder,
            self.series.name(),
            kind,
            self.file_date()?,
            ext,
        ))
    }

    fn save_figure<R: ChartRenderer>(&self, chart: &R, kind: &str) -> Result<OutputPair> {
        let pair = self.output(self.fig_folder.as_deref(), kind, "png")?;
        chart.render_to_file(&pair.dated, self.size)?;
        pair.promote()?;
        info!(
            "Figure saved to {} and {}",
            pair.dated.display(),
            pair.latest.display()
        );
        Ok(pair)
    }

    /// Save the cumulative chart and/or its data.
    pub fn save_series(&self, title: &str, save: SaveOptions) -> Result<SavedOutputs> {
        let mut saved = SavedOutputs::default();
        if save.figure {
            saved.figure = Some(self.save_figure(&self.series_chart(title), "series")?);
        }
        if save.csv {
            let pair = self.output(self.csv_folder.as_deref(), "series", "csv")?;
            export::save_csv(&pair, &self.series, &[])?;
            saved.csv = Some(pair);
        }
        Ok(saved)
    }

    /// Save the new-cases chart and/or the differenced data.
    pub fn save_new(&self, title: &str, save: SaveOptions) -> Result<SavedOutputs> {
        let chart = self.new_cases_chart(title);
        let mut saved = SavedOutputs::default();
        if save.figure {
            saved.figure = Some(self.save_figure(&chart, "new")?);
        }
        if save.csv {
            let pair = self.output(self.csv_folder.as_deref(), "new", "csv")?;
            export::save_csv(&pair, chart.diff(), &[])?;
            saved.csv = Some(pair);
        }
        Ok(saved)
    }

    /// Save the growth-factor chart and/or the raw, SMA and EMA columns.
    ///
    /// The CSV always carries all three columns, whatever lines are drawn.
    pub fn save_growth_factor(
        &self,
        title: &str,
        options: &GrowthFactorOptions,
        save: SaveOptions,
    ) -> Result<SavedOutputs> {
        let chart = self.growth_chart(title, options)?;
        let mut saved = SavedOutputs::default();
        if save.figure {
            saved.figure = Some(self.save_figure(&chart, "gf")?);
        }
        if save.csv {
            let pair = self.output(self.csv_folder.as_deref(), "gf", "csv")?;
            let growth = chart.growth();
            export::save_csv(&pair, &growth.raw, &[&growth.sma, &growth.ema])?;
            saved.csv = Some(pair);
        }
        Ok(saved)
    }
}
