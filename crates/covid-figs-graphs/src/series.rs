//! Daily time series and the growth-factor transforms derived from them.
//!
//! Values are `f64`; `NaN` marks an undefined value (no observation, no prior
//! day, 0/0). `±inf` is a defined but non-finite value (x/0) and is kept so the
//! charts can leave it out while the CSV snapshots still carry it.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use covid_figs_common::{FigsError, Result};
use std::collections::BTreeMap;

/// A named series holding exactly one value per calendar day, without gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl NamedSeries {
    /// Create a series from consecutive daily dates and their values.
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(FigsError::validation(format!(
                "Length of values ({}) does not match length of the date index ({})",
                values.len(),
                dates.len()
            )));
        }
        if let Some(pair) = dates.windows(2).find(|w| w[1] != w[0] + Duration::days(1)) {
            return Err(FigsError::validation(format!(
                "Date index is not daily: {} is followed by {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self {
            name: name.into(),
            dates,
            values,
        })
    }

    /// Resample timestamped observations to one value per calendar day.
    ///
    /// Each day takes its last non-NaN observation; days between the first and
    /// last observed day without one are NaN.
    pub fn from_observations<I>(name: impl Into<String>, observations: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDateTime, f64)>,
    {
        let mut sorted: Vec<(NaiveDateTime, f64)> = observations.into_iter().collect();
        sorted.sort_by_key(|(ts, _)| *ts);

        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (ts, value) in &sorted {
            let slot = by_day.entry(ts.date()).or_insert(f64::NAN);
            if !value.is_nan() {
                *slot = *value;
            }
        }

        let (Some(first), Some(last)) = (by_day.keys().next().copied(), by_day.keys().next_back().copied())
        else {
            return Self {
                name: name.into(),
                dates: Vec::new(),
                values: Vec::new(),
            };
        };

        let dates: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();
        let values = dates
            .iter()
            .map(|d| by_day.get(d).copied().unwrap_or(f64::NAN))
            .collect();

        Self {
            name: name.into(),
            dates,
            values,
        }
    }

    /// Series name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Daily date index.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Values aligned with [`Self::dates`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of days in the series.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no days.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First day of the index.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last day of the index.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Value on `date`, if the date is inside the index.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        let first = self.first_date()?;
        let offset = usize::try_from((date - first).num_days()).ok()?;
        self.values.get(offset).copied()
    }

    /// `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of values that are not NaN.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Same index and values under another name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    fn with_values(&self, values: Vec<f64>) -> Self {
        Self {
            name: self.name.clone(),
            dates: self.dates.clone(),
            values,
        }
    }

    /// Values moved `periods` days later; the first `periods` days become NaN.
    #[must_use]
    pub fn shift(&self, periods: usize) -> Self {
        let values = (0..self.len())
            .map(|i| i.checked_sub(periods).map_or(f64::NAN, |j| self.values[j]))
            .collect();
        self.with_values(values)
    }

    /// Day-over-day difference; the first day is NaN.
    #[must_use]
    pub fn diff(&self) -> Self {
        let shifted = self.shift(1);
        let values = self
            .values
            .iter()
            .zip(shifted.values())
            .map(|(v, prev)| v - prev)
            .collect();
        self.with_values(values)
    }

    /// Ratio of each day's difference to the difference `lookback` days earlier.
    ///
    /// A zero denominator yields `±inf` (or NaN for 0/0).
    #[must_use]
    pub fn growth_factor(&self, lookback: usize) -> Self {
        let diff = self.diff();
        let lagged = diff.shift(lookback);
        let values = diff
            .values()
            .iter()
            .zip(lagged.values())
            .map(|(d, lag)| d / lag)
            .collect();
        self.with_values(values)
    }

    /// Trailing mean over `window` days.
    ///
    /// NaN until the window is filled and whenever the window holds a NaN.
    #[must_use]
    pub fn rolling_mean(&self, window: usize) -> Self {
        let window = window.max(1);
        let values = (0..self.len())
            .map(|i| {
                if i + 1 < window {
                    return f64::NAN;
                }
                let slice = &self.values[i + 1 - window..=i];
                if slice.iter().any(|v| v.is_nan()) {
                    f64::NAN
                } else {
                    slice.iter().sum::<f64>() / window as f64
                }
            })
            .collect();
        self.with_values(values)
    }

    /// Adjusted exponentially weighted mean with `alpha = 2 / (span + 1)`.
    ///
    /// The observation `i` days back weighs `(1 - alpha)^i`. NaN observations
    /// contribute nothing but still age the older weights. The output is NaN
    /// before the first defined value and equals it at that position.
    #[must_use]
    pub fn ewm_mean(&self, span: usize) -> Self {
        let alpha = 2.0 / (span.max(1) as f64 + 1.0);
        let decay = 1.0 - alpha;

        let mut values = Vec::with_capacity(self.len());
        let mut weighted = f64::NAN;
        let mut old_weight = 1.0;

        for &current in &self.values {
            let observed = !current.is_nan();
            if weighted.is_nan() {
                if observed {
                    weighted = current;
                    old_weight = 1.0;
                }
            } else {
                old_weight *= decay;
                if observed {
                    // Equal values would turn inf - inf into NaN.
                    if weighted != current {
                        weighted = old_weight.mul_add(weighted, current) / (old_weight + 1.0);
                    }
                    old_weight += 1.0;
                }
            }
            values.push(weighted);
        }

        self.with_values(values)
    }
}

/// Raw growth factor with its simple and exponential moving averages.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSeries {
    /// Raw ratio, named after the source series.
    pub raw: NamedSeries,
    /// Trailing simple moving average.
    pub sma: NamedSeries,
    /// Exponential moving average.
    pub ema: NamedSeries,
}

impl GrowthSeries {
    /// Derive the three growth views of `series`.
    pub fn compute(series: &NamedSeries, lookback: usize, window: usize, span: usize) -> Self {
        let raw = series.growth_factor(lookback);
        let sma = raw
            .rolling_mean(window)
            .renamed(format!("{} (SMA {window} giorni)", series.name()));
        let ema = raw
            .ewm_mean(span)
            .renamed(format!("{} (EMA {span} giorni)", series.name()));
        Self { raw, sma, ema }
    }
}
