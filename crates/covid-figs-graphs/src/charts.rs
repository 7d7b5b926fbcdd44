//! The three chart kinds drawn for every series: cumulative, new cases, growth.

use crate::layout;
use crate::renderer::{split_title, ChartRenderer, ChartStyle};
use crate::series::{GrowthSeries, NamedSeries};
use covid_figs_common::{FigsError, Result};
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

/// X axis in day offsets whose key points are the labelled dates.
struct DayAxis {
    inner: RangedCoordf64,
}

impl DayAxis {
    fn new(lo: f64, hi: f64) -> Self {
        Self {
            inner: (lo..hi).into(),
        }
    }
}

impl Ranged for DayAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, _hint: Hint) -> Vec<f64> {
        let range = self.inner.range();
        layout::date_ticks(range.start, range.end)
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

/// Parameters of a growth-factor chart.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthFactorOptions {
    /// Days between the two differences of the ratio.
    pub lookback: usize,
    /// Trailing window of the simple moving average.
    pub window: usize,
    /// Span of the exponential moving average.
    pub span: usize,
    pub include_raw: bool,
    pub include_sma: bool,
    pub include_ema: bool,
    /// Fixed y range; fitted to the data when unset.
    pub y_limit: Option<(f64, f64)>,
}

impl Default for GrowthFactorOptions {
    fn default() -> Self {
        Self {
            lookback: 1,
            window: 3,
            span: 3,
            include_raw: true,
            include_sma: true,
            include_ema: true,
            y_limit: None,
        }
    }
}

impl GrowthFactorOptions {
    /// Options of the overview panels: no SMA line and a fixed `0..5` range.
    pub fn overview() -> Self {
        Self {
            include_sma: false,
            y_limit: Some((0.0, 5.0)),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 || self.window == 0 || self.span == 0 {
            return Err(FigsError::validation(
                "lookback, window and span must be greater than 0",
            ));
        }
        if let Some((lo, hi)) = self.y_limit {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(FigsError::validation_field(
                    format!("Y range ({lo}, {hi}) must be finite and increasing"),
                    "y_limit",
                ));
            }
        }
        Ok(())
    }
}

/// Line chart of a cumulative series.
#[derive(Debug, Clone)]
pub struct SeriesChart {
    series: NamedSeries,
    title: Vec<String>,
    style: ChartStyle,
}

impl SeriesChart {
    pub fn new(series: NamedSeries, title: Vec<String>, style: ChartStyle) -> Self {
        Self {
            series,
            title,
            style,
        }
    }

    /// Runs of finite points at day offsets.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        layout::finite_segments(self.series.values())
    }

    /// Visible day offsets: the full date range of the series.
    pub fn x_range(&self) -> (f64, f64) {
        layout::x_range(0.0, self.series.len().saturating_sub(1) as f64)
    }
}

impl ChartRenderer for SeriesChart {
    fn draw_on<DB>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        let body = split_title(area, &self.title, self.style.title_size, &self.style)?;
        let Some(origin) = self.series.first_date() else {
            return Ok(());
        };

        let (x0, x1) = self.x_range();
        let (y0, y1) = layout::y_range(self.series.values().iter().copied(), &[]);
        let format_x = |x: &f64| layout::date_label(origin, *x);
        let format_y = |y: &f64| format!("{y:.0}");

        let mut chart = ChartBuilder::on(&body)
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(70)
            .build_cartesian_2d(DayAxis::new(x0, x1), y0..y1)?;

        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .x_label_formatter(&format_x)
            .y_label_formatter(&format_y)
            .label_style(self.style.label_font())
            .draw()?;

        let color = self.style.color(0);
        for segment in self.segments() {
            if segment.len() == 1 {
                chart.draw_series(segment.into_iter().map(|p| Circle::new(p, 3, color.filled())))?;
            } else {
                chart.draw_series(LineSeries::new(
                    segment,
                    color.stroke_width(self.style.line_width),
                ))?;
            }
        }
        Ok(())
    }
}

/// Bar chart of the first difference of a cumulative series.
#[derive(Debug, Clone)]
pub struct NewCasesChart {
    diff: NamedSeries,
    title: Vec<String>,
    style: ChartStyle,
}

impl NewCasesChart {
    /// Chart of the daily differences of `series`.
    pub fn new(series: &NamedSeries, title: Vec<String>, style: ChartStyle) -> Self {
        Self {
            diff: series.diff(),
            title,
            style,
        }
    }

    /// The differenced series.
    pub fn diff(&self) -> &NamedSeries {
        &self.diff
    }

    /// `(day offset, height)` of every bar; undefined differences draw none.
    pub fn bars(&self) -> Vec<(f64, f64)> {
        self.diff
            .values()
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, v)| (i as f64, *v))
            .collect()
    }

    /// Visible day offsets, shifted half a day to the right.
    pub fn x_range(&self) -> (f64, f64) {
        let last = self.diff.len().saturating_sub(1) as f64;
        layout::x_range(0.5, last + 0.5)
    }
}

impl ChartRenderer for NewCasesChart {
    fn draw_on<DB>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        let body = split_title(area, &self.title, self.style.title_size, &self.style)?;
        let Some(origin) = self.diff.first_date() else {
            return Ok(());
        };

        let bars = self.bars();
        let (x0, x1) = self.x_range();
        let (y0, y1) = layout::y_range(bars.iter().map(|(_, v)| *v), &[0.0]);
        let format_x = |x: &f64| layout::date_label(origin, *x);
        let format_y = |y: &f64| format!("{y:.0}");

        let mut chart = ChartBuilder::on(&body)
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(70)
            .build_cartesian_2d(DayAxis::new(x0, x1), y0..y1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(&TRANSPARENT)
            .x_label_formatter(&format_x)
            .y_label_formatter(&format_y)
            .label_style(self.style.label_font())
            .draw()?;

        let fill = self.style.color(0).filled();
        chart.draw_series(bars.into_iter().map(|(x, v)| {
            Rectangle::new(
                [(x - layout::BAR_HALF_WIDTH, 0.0), (x + layout::BAR_HALF_WIDTH, v)],
                fill,
            )
        }))?;
        Ok(())
    }
}

/// One legend entry of a growth chart.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthLine {
    pub name: String,
    pub color: usize,
    pub segments: Vec<Vec<(f64, f64)>>,
}

/// Growth factor lines with the dashed reference at 1.0.
#[derive(Debug, Clone)]
pub struct GrowthChart {
    growth: GrowthSeries,
    options: GrowthFactorOptions,
    title: Vec<String>,
    style: ChartStyle,
}

impl GrowthChart {
    /// Chart of the growth factor of `series`.
    pub fn new(
        series: &NamedSeries,
        title: Vec<String>,
        options: GrowthFactorOptions,
        style: ChartStyle,
    ) -> Result<Self> {
        options.validate()?;
        let growth = GrowthSeries::compute(series, options.lookback, options.window, options.span);
        Ok(Self {
            growth,
            options,
            title,
            style,
        })
    }

    pub fn growth(&self) -> &GrowthSeries {
        &self.growth
    }

    pub fn options(&self) -> &GrowthFactorOptions {
        &self.options
    }

    fn included(&self) -> Vec<(&NamedSeries, usize)> {
        [
            (self.options.include_raw, &self.growth.raw, 0),
            (self.options.include_sma, &self.growth.sma, 1),
            (self.options.include_ema, &self.growth.ema, 2),
        ]
        .into_iter()
        .filter(|(included, _, _)| *included)
        .map(|(_, series, color)| (series, color))
        .collect()
    }

    /// Y range: the fixed limit, or every finite plotted value and 1.0.
    pub fn y_range(&self) -> (f64, f64) {
        self.options.y_limit.unwrap_or_else(|| {
            layout::y_range(
                self.included()
                    .into_iter()
                    .flat_map(|(s, _)| s.values().iter().copied()),
                &[1.0],
            )
        })
    }

    /// Visible day offsets: the full date range of the source series.
    pub fn x_range(&self) -> (f64, f64) {
        layout::x_range(0.0, self.growth.raw.len().saturating_sub(1) as f64)
    }

    /// Plotted lines, split at non-finite values and clipped to the y range.
    pub fn lines(&self) -> Vec<GrowthLine> {
        let (lo, hi) = self.y_range();
        self.included()
            .into_iter()
            .map(|(series, color)| GrowthLine {
                name: series.name().to_string(),
                color,
                segments: layout::clip_segments(
                    &layout::finite_segments(series.values()),
                    lo,
                    hi,
                ),
            })
            .collect()
    }
}

impl ChartRenderer for GrowthChart {
    fn draw_on<DB>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        let body = split_title(area, &self.title, self.style.title_size, &self.style)?;
        let Some(origin) = self.growth.raw.first_date() else {
            return Ok(());
        };

        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();
        let format_x = |x: &f64| layout::date_label(origin, *x);
        let format_y = |y: &f64| format!("{y:.1}");

        let mut chart = ChartBuilder::on(&body)
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(70)
            .build_cartesian_2d(DayAxis::new(x0, x1), y0..y1)?;

        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .x_label_formatter(&format_x)
            .y_label_formatter(&format_y)
            .label_style(self.style.label_font())
            .draw()?;

        let lines = self.lines();
        for line in &lines {
            let style = self.style.color(line.color).stroke_width(self.style.line_width);
            // Legend entry even when the line has nothing finite to draw.
            chart
                .draw_series(LineSeries::new(Vec::<(f64, f64)>::new(), style))?
                .label(line.name.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            for segment in &line.segments {
                chart.draw_series(LineSeries::new(segment.iter().copied(), style))?;
            }
        }

        if (y0..=y1).contains(&1.0) {
            let reference = self.style.reference_color.stroke_width(1);
            chart.draw_series(
                layout::dashes(x0, x1)
                    .into_iter()
                    .map(|(a, b)| PathElement::new(vec![(a, 1.0), (b, 1.0)], reference)),
            )?;
        }

        if !lines.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font(self.style.label_font())
                .draw()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use covid_figs_common::test_utils::recording::RecordingBackend;

    fn series(values: &[f64]) -> NamedSeries {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        NamedSeries::new("totali Lombardia", dates, values.to_vec()).unwrap()
    }

    fn title(text: &str) -> Vec<String> {
        vec![text.to_string()]
    }

    #[test]
    fn test_options_validation() {
        assert!(GrowthFactorOptions::default().validate().is_ok());
        assert!(GrowthFactorOptions::overview().validate().is_ok());
        let bad = GrowthFactorOptions {
            y_limit: Some((5.0, 0.0)),
            ..GrowthFactorOptions::default()
        };
        assert!(bad.validate().is_err());
        let zero = GrowthFactorOptions {
            span: 0,
            ..GrowthFactorOptions::default()
        };
        assert!(GrowthChart::new(&series(&[1.0]), title("x"), zero, ChartStyle::default()).is_err());
    }

    #[test]
    fn test_series_chart_draws_title_and_line() {
        let chart = SeriesChart::new(
            series(&[1.0, 2.0, 4.0, 7.0]),
            title("Casi in Lombardia"),
            ChartStyle::default(),
        );
        assert_eq!(chart.x_range(), (0.0, 3.0));

        let (backend, log) = RecordingBackend::new((800, 500));
        let root = backend.into_drawing_area();
        chart.draw_on(&root).unwrap();

        let log = log.borrow();
        assert!(log.has_text("Casi in Lombardia"));
        assert!(log.has_text("03/03"));
        assert!(log.paths.contains(&4));
    }

    fn date_labels(texts: &[String]) -> Vec<String> {
        texts
            .iter()
            .filter(|t| t.len() == 5 && t.as_bytes()[2] == b'/')
            .cloned()
            .collect()
    }

    #[test]
    fn test_day_axis_ticks_every_two_days() {
        let axis = DayAxis::new(0.0, 6.0);
        assert_eq!(axis.key_points(10usize), vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(axis.range(), 0.0..6.0);

        let shifted = DayAxis::new(0.5, 6.5);
        assert_eq!(shifted.key_points(10usize), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_date_labels_are_two_days_apart() {
        let chart = SeriesChart::new(
            series(&[1.0, 2.0, 4.0, 7.0, 11.0, 16.0, 22.0]),
            title("Casi in Lombardia"),
            ChartStyle::default(),
        );
        let (backend, log) = RecordingBackend::new((800, 500));
        chart.draw_on(&backend.into_drawing_area()).unwrap();

        let labels = date_labels(&log.borrow().texts);
        for expected in ["03/03", "05/03"] {
            assert!(labels.iter().any(|l| l == expected), "missing {expected}");
        }
        for label in &labels {
            assert!(
                ["01/03", "03/03", "05/03", "07/03"].contains(&label.as_str()),
                "unexpected tick {label}"
            );
        }
    }

    #[test]
    fn test_growth_legend_lists_lines_without_points() {
        // One day: every growth value is undefined.
        let chart = GrowthChart::new(
            &series(&[5.0]),
            title("Tasso di crescita dei casi in Lombardia"),
            GrowthFactorOptions::overview(),
            ChartStyle::default(),
        )
        .unwrap();
        assert!(chart.lines().iter().all(|l| l.segments.is_empty()));

        let (backend, log) = RecordingBackend::new((800, 500));
        chart.draw_on(&backend.into_drawing_area()).unwrap();
        let log = log.borrow();
        assert!(log.has_text("totali Lombardia"));
        assert!(log.has_text("totali Lombardia (EMA 3 giorni)"));
        assert!(!log.has_text("totali Lombardia (SMA 3 giorni)"));
    }

    #[test]
    fn test_new_cases_bars_skip_first_day() {
        let chart = NewCasesChart::new(
            &series(&[1.0, 3.0, 6.0]),
            title("Nuovi casi giornalieri in Lombardia"),
            ChartStyle::default(),
        );
        assert_eq!(chart.bars(), vec![(1.0, 2.0), (2.0, 3.0)]);
        assert_eq!(chart.x_range(), (0.5, 2.5));

        let (backend, log) = RecordingBackend::new((800, 500));
        chart.draw_on(&backend.into_drawing_area()).unwrap();
        assert!(log.borrow().filled_rects >= 2);
    }

    #[test]
    fn test_growth_lines_with_zero_denominator() {
        // diffs: NaN, 2, 0, 3, 6 -> growth: NaN, NaN, 0, inf, 2
        let chart = GrowthChart::new(
            &series(&[1.0, 3.0, 3.0, 6.0, 12.0]),
            title("Tasso di crescita dei casi in Lombardia"),
            GrowthFactorOptions::overview(),
            ChartStyle::default(),
        )
        .unwrap();

        let lines = chart.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "totali Lombardia");
        assert_eq!(lines[0].segments, vec![vec![(2.0, 0.0)], vec![(4.0, 2.0)]]);
        assert_eq!(lines[1].name, "totali Lombardia (EMA 3 giorni)");
        assert_eq!(chart.y_range(), (0.0, 5.0));

        let (backend, log) = RecordingBackend::new((800, 500));
        chart.draw_on(&backend.into_drawing_area()).unwrap();
        let log = log.borrow();
        assert!(log.has_text("totali Lombardia"));
        assert!(log.has_text("totali Lombardia (EMA 3 giorni)"));
    }

    #[test]
    fn test_growth_range_fits_data_and_reference() {
        let chart = GrowthChart::new(
            &series(&[0.0, 1.0, 3.0, 7.0]),
            title("gf"),
            GrowthFactorOptions::default(),
            ChartStyle::default(),
        )
        .unwrap();
        let (lo, hi) = chart.y_range();
        assert!(lo < 1.0 && hi > 2.0);
        assert_eq!(chart.lines().len(), 3);
    }
}
