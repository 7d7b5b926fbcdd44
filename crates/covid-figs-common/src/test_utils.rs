//! Test utilities and shared fixtures for the covid-figs workspace.
//!
//! Available to other crates through the `testing` feature.

use chrono::NaiveDate;
use std::fmt::Write as _;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt()
            .with_test_writer()
            .with_env_filter(filter)
            .try_init();
    });
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Upstream feed fixtures shaped like the published CSV files.
pub mod feed_fixtures {
    use super::*;

    /// Header of the regional feed, trimmed to the columns the charts use.
    pub const REGIONAL_HEADER: &str =
        "data,stato,codice_regione,denominazione_regione,terapia_intensiva,deceduti,totale_casi";

    /// Header of the national feed, trimmed to the columns the charts use.
    pub const NATIONAL_HEADER: &str = "data,stato,terapia_intensiva,deceduti,totale_casi";

    /// One daily record: (total cases, deaths, intensive care).
    pub type DailyCounts = (u32, u32, u32);

    /// Build `days` consecutive daily counts with strictly increasing totals.
    pub fn increasing_counts(days: usize) -> Vec<DailyCounts> {
        (0..days)
            .map(|i| {
                let i = i as u32;
                (100 + 10 * i * i + 5 * i, 2 + i * i / 2, 5 + 2 * i)
            })
            .collect()
    }

    /// Regional CSV with one row per day for each listed region.
    pub fn regional_csv(start: NaiveDate, regions: &[(&str, Vec<DailyCounts>)]) -> String {
        let mut out = String::from(REGIONAL_HEADER);
        out.push('\n');
        let days = regions.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
        for day in 0..days {
            let date = start + chrono::Duration::days(day as i64);
            for (code, (region, counts)) in regions.iter().enumerate() {
                if let Some((total, deaths, icu)) = counts.get(day) {
                    let _ = writeln!(
                        out,
                        "{}T17:00:00,ITA,{},{},{},{},{}",
                        date.format("%Y-%m-%d"),
                        code + 1,
                        region,
                        icu,
                        deaths,
                        total
                    );
                }
            }
        }
        out
    }

    /// National CSV; each entry is written at every listed hour of its day.
    pub fn national_csv(start: NaiveDate, counts: &[DailyCounts], hours: &[u32]) -> String {
        let mut out = String::from(NATIONAL_HEADER);
        out.push('\n');
        for (day, (total, deaths, icu)) in counts.iter().enumerate() {
            let date = start + chrono::Duration::days(day as i64);
            for (n, hour) in hours.iter().enumerate() {
                let n = n as u32;
                let _ = writeln!(
                    out,
                    "{}T{:02}:00:00,ITA,{},{},{}",
                    date.format("%Y-%m-%d"),
                    hour,
                    icu.saturating_sub(hours.len() as u32 - 1 - n),
                    deaths,
                    total.saturating_sub(hours.len() as u32 - 1 - n)
                );
            }
        }
        out
    }

    /// Commits API response body with a single commit at `date` (RFC 3339).
    pub fn commit_history_json(date: &str) -> String {
        format!(
            r#"[{{"sha":"0123456789abcdef","commit":{{"author":{{"name":"pcm-dpc","date":"{date}"}},"committer":{{"name":"pcm-dpc","date":"{date}"}},"message":"update"}}}}]"#
        )
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use proptest::prelude::*;

    /// Strategy for cumulative counts: non-decreasing, possibly with gaps.
    pub fn cumulative_counts_strategy(max_len: usize) -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(0u32..500, 1..max_len).prop_map(|steps| {
            steps
                .into_iter()
                .scan(0u32, |acc, step| {
                    *acc += step;
                    Some(*acc)
                })
                .collect()
        })
    }

    /// Strategy for hour-of-day offsets of same-day observations.
    pub fn hours_strategy() -> impl Strategy<Value = Vec<u32>> {
        prop::collection::btree_set(0u32..24, 1..4).prop_map(|s| s.into_iter().collect())
    }
}

/// Drawing backend that records primitives instead of rasterizing them.
///
/// Text is measured from its length and font size, so charts can be drawn
/// on hosts without any system fonts.
#[cfg(feature = "plotters")]
pub mod recording {
    use plotters_backend::{
        BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend,
        DrawingErrorKind,
    };
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    /// Everything drawn through a [`RecordingBackend`].
    #[derive(Debug, Default, Clone)]
    pub struct DrawLog {
        /// Every text string, in draw order.
        pub texts: Vec<String>,
        /// Point count of every path.
        pub paths: Vec<usize>,
        /// Number of filled rectangles.
        pub filled_rects: usize,
        /// Number of circles.
        pub circles: usize,
        /// Whether `present` was called.
        pub presented: bool,
    }

    impl DrawLog {
        /// Whether some drawn text equals `text`.
        pub fn has_text(&self, text: &str) -> bool {
            self.texts.iter().any(|t| t == text)
        }
    }

    /// Shared handle to the log of a backend moved into a drawing area.
    pub type SharedLog = Rc<RefCell<DrawLog>>;

    #[derive(Debug)]
    pub struct RecordingBackend {
        size: (u32, u32),
        log: SharedLog,
    }

    impl RecordingBackend {
        /// A backend of `size` pixels and the handle to what it records.
        pub fn new(size: (u32, u32)) -> (Self, SharedLog) {
            let log = SharedLog::default();
            (
                Self {
                    size,
                    log: Rc::clone(&log),
                },
                log,
            )
        }
    }

    impl DrawingBackend for RecordingBackend {
        type ErrorType = Infallible;

        fn get_size(&self) -> (u32, u32) {
            self.size
        }

        fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Infallible>> {
            Ok(())
        }

        fn present(&mut self) -> Result<(), DrawingErrorKind<Infallible>> {
            self.log.borrow_mut().presented = true;
            Ok(())
        }

        fn draw_pixel(
            &mut self,
            _point: BackendCoord,
            _color: BackendColor,
        ) -> Result<(), DrawingErrorKind<Infallible>> {
            Ok(())
        }

        fn draw_line<S: BackendStyle>(
            &mut self,
            _from: BackendCoord,
            _to: BackendCoord,
            _style: &S,
        ) -> Result<(), DrawingErrorKind<Infallible>> {
            Ok(())
        }

        fn draw_rect<S: BackendStyle>(
            &mut self,
            _upper_left: BackendCoord,
            _bottom_right: BackendCoord,
            _style: &S,
            fill: bool,
        ) -> Result<(), DrawingErrorKind<Infallible>> {
            if fill {
                self.log.borrow_mut().filled_rects += 1;
            }
            Ok(())
        }

        fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
            &mut self,
            path: I,
            _style: &S,
        ) -> Result<(), DrawingErrorKind<Infallible>> {
            let points = path.into_iter().count();
            self.log.borrow_mut().paths.push(points);
            Ok(())
        }

        fn draw_circle<S: BackendStyle>(
            &mut self,
            _center: BackendCoord,
            _radius: u32,
            _style: &S,
            _fill: bool,
        ) -> Result<(), DrawingErrorKind<Infallible>> {
            self.log.borrow_mut().circles += 1;
            Ok(())
        }

        fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
            &mut self,
            _vert: I,
            _style: &S,
        ) -> Result<(), DrawingErrorKind<Infallible>> {
            Ok(())
        }

        fn draw_text<TStyle: BackendTextStyle>(
            &mut self,
            text: &str,
            _style: &TStyle,
            _pos: BackendCoord,
        ) -> Result<(), DrawingErrorKind<Infallible>> {
            self.log.borrow_mut().texts.push(text.to_string());
            Ok(())
        }

        fn estimate_text_size<TStyle: BackendTextStyle>(
            &self,
            text: &str,
            style: &TStyle,
        ) -> Result<(u32, u32), DrawingErrorKind<Infallible>> {
            let size = style.size().max(1.0);
            let width = text.chars().count() as f64 * size * 0.6;
            Ok((width.ceil() as u32, size.ceil() as u32))
        }
    }
}
