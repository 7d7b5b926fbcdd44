//! Backend-independent geometry: axis ranges, date ticks and line segments.

use chrono::{Duration, NaiveDate};

/// Pixels above the first title line.
pub(crate) const TITLE_PADDING: u32 = 8;

/// Date ticks are placed this many days apart by default.
pub const TICK_INTERVAL_DAYS: u32 = 2;

/// Upper bound on labelled date ticks; the interval widens past it.
pub const MAX_DATE_TICKS: u32 = 30;

/// Half width, in days, of a new-cases bar.
pub const BAR_HALF_WIDTH: f64 = 0.4;

/// Length, in days, of one dash of the reference line and of the gap after it.
pub const DASH_LENGTH: f64 = 0.25;

pub(crate) fn title_line_height(font_size: u32) -> u32 {
    font_size + font_size / 3
}

pub(crate) fn title_block_height(font_size: u32, lines: usize) -> u32 {
    if lines == 0 {
        0
    } else {
        2 * TITLE_PADDING + title_line_height(font_size) * lines as u32
    }
}

/// Axis range covering `lo..hi`, widened by half a unit each side when empty.
pub fn x_range(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, lo + 0.5)
    }
}

/// Y range covering every finite value and every `extra` value.
///
/// Pads by 5% of the span; a flat range is widened by one unit and a range
/// with no finite value at all is `0..1`.
pub fn y_range<I>(values: I, extra: &[f64]) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
{
    let (lo, hi) = values
        .into_iter()
        .chain(extra.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    }
}

/// Interval between labelled date ticks for a range spanning `days` days.
pub fn tick_interval(days: f64) -> u32 {
    let mut interval = TICK_INTERVAL_DAYS;
    while days / f64::from(interval) > f64::from(MAX_DATE_TICKS) {
        interval += TICK_INTERVAL_DAYS;
    }
    interval
}

/// Day offsets inside `lo..=hi` that carry a date label.
pub fn date_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let interval = tick_interval(hi - lo);
    let first = lo.max(0.0).ceil() as i64;
    let last = hi.floor() as i64;
    (first..=last)
        .filter(|offset| offset % i64::from(interval) == 0)
        .map(|offset| offset as f64)
        .collect()
}

/// Label of the day `offset` days after `origin`.
pub fn date_label(origin: NaiveDate, offset: f64) -> String {
    (origin + Duration::days(offset.round() as i64))
        .format("%d/%m")
        .to_string()
}

/// Points of `values` at day offsets, split into runs of finite values.
///
/// Undefined and infinite values end a run so the line shows a gap.
pub fn finite_segments(values: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            current.push((i as f64, v));
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Clip polyline segments to the horizontal band `lo..=hi`.
///
/// Crossing points are interpolated; parts outside the band are dropped.
pub fn clip_segments(segments: &[Vec<(f64, f64)>], lo: f64, hi: f64) -> Vec<Vec<(f64, f64)>> {
    let inside = |y: f64| (lo..=hi).contains(&y);
    let crossing = |(x0, y0): (f64, f64), (x1, y1): (f64, f64), y: f64| {
        (x0 + (x1 - x0) * (y - y0) / (y1 - y0), y)
    };

    let mut clipped = Vec::new();
    for segment in segments {
        let mut current: Vec<(f64, f64)> = Vec::new();
        for (i, &point) in segment.iter().enumerate() {
            if i == 0 {
                if inside(point.1) {
                    current.push(point);
                }
                continue;
            }
            let prev = segment[i - 1];
            match (inside(prev.1), inside(point.1)) {
                (true, true) => current.push(point),
                (true, false) => {
                    let edge = if point.1 > hi { hi } else { lo };
                    current.push(crossing(prev, point, edge));
                    clipped.push(std::mem::take(&mut current));
                }
                (false, true) => {
                    let edge = if prev.1 > hi { hi } else { lo };
                    current.push(crossing(prev, point, edge));
                    current.push(point);
                }
                (false, false) => {
                    // Both outside but on opposite sides: the band is crossed.
                    if (prev.1 > hi && point.1 < lo) || (prev.1 < lo && point.1 > hi) {
                        let (a, b) = if prev.1 > hi { (hi, lo) } else { (lo, hi) };
                        clipped.push(vec![crossing(prev, point, a), crossing(prev, point, b)]);
                    }
                }
            }
        }
        if !current.is_empty() {
            clipped.push(current);
        }
    }
    clipped
}

/// `(start, end)` pairs of a dashed horizontal line across `lo..hi`.
pub fn dashes(lo: f64, hi: f64) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    let mut x = lo;
    while x < hi {
        out.push((x, (x + DASH_LENGTH).min(hi)));
        x += 2.0 * DASH_LENGTH;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x_range_widens_single_point() {
        assert_eq!(x_range(0.0, 9.0), (0.0, 9.0));
        assert_eq!(x_range(0.0, 0.0), (-0.5, 0.5));
    }

    #[test]
    fn test_y_range() {
        assert_eq!(y_range(Vec::new(), &[]), (0.0, 1.0));
        assert_eq!(y_range(vec![f64::NAN, f64::INFINITY], &[]), (0.0, 1.0));
        assert_eq!(y_range(vec![3.0], &[]), (2.0, 4.0));
        assert_eq!(y_range(vec![0.0, 10.0], &[]), (-0.5, 10.5));
        let (lo, hi) = y_range(vec![2.0, 3.0], &[1.0]);
        assert!(lo < 1.0 && hi > 3.0);
    }

    #[test]
    fn test_ticks_every_two_days() {
        assert_eq!(date_ticks(0.0, 9.0), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(date_ticks(0.5, 9.5), vec![2.0, 4.0, 6.0, 8.0]);
        assert_eq!(date_ticks(-0.5, 0.5), vec![0.0]);
    }

    #[test]
    fn test_tick_interval_widens_for_long_ranges() {
        assert_eq!(tick_interval(40.0), 2);
        assert_eq!(tick_interval(60.0), 2);
        assert_eq!(tick_interval(61.0), 4);
        assert!(date_ticks(0.0, 1000.0).len() <= MAX_DATE_TICKS as usize + 1);
    }

    #[test]
    fn test_date_label() {
        let origin = NaiveDate::from_ymd_opt(2020, 2, 28).unwrap();
        assert_eq!(date_label(origin, 2.0), "01/03");
    }

    #[test]
    fn test_finite_segments_leave_gaps() {
        let segments = finite_segments(&[f64::NAN, 1.0, 2.0, f64::INFINITY, 3.0, f64::NAN]);
        assert_eq!(segments, vec![vec![(1.0, 1.0), (2.0, 2.0)], vec![(4.0, 3.0)]]);
        assert!(finite_segments(&[f64::NAN]).is_empty());
    }

    #[test]
    fn test_clip_segments() {
        let clipped = clip_segments(&[vec![(0.0, 1.0), (1.0, 9.0), (2.0, 1.0)]], 0.0, 5.0);
        assert_eq!(clipped, vec![vec![(0.0, 1.0), (0.5, 5.0)], vec![(1.5, 5.0), (2.0, 1.0)]]);

        let crossing = clip_segments(&[vec![(0.0, 10.0), (1.0, -10.0)]], 0.0, 5.0);
        assert_eq!(crossing, vec![vec![(0.25, 5.0), (0.5, 0.0)]]);

        assert!(clip_segments(&[vec![(0.0, 8.0), (1.0, 9.0)]], 0.0, 5.0).is_empty());
    }

    #[test]
    fn test_dashes_cover_range() {
        let d = dashes(0.0, 1.0);
        assert_eq!(d, vec![(0.0, 0.25), (0.5, 0.75)]);
    }
}
