//! Common type definitions shared across the workspace.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp of the most recent upstream commit touching a data file,
/// expressed in the display time zone.
pub type LastModified = DateTime<Tz>;

/// Upstream feed an area is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    /// Per-region daily records, one row per (date, region).
    Regional,
    /// National records, possibly several updates per day.
    National,
}

impl Feed {
    /// All feeds in fetch order.
    pub const ALL: [Self; 2] = [Self::Regional, Self::National];

    /// Whether the fetched table is collapsed to one row per day.
    pub const fn resample_on_fetch(self) -> bool {
        matches!(self, Self::National)
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regional => write!(f, "regional"),
            Self::National => write!(f, "national"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_serde_and_display() {
        let feed: Feed = serde_json::from_str("\"national\"").unwrap();
        assert_eq!(feed, Feed::National);
        assert_eq!(Feed::Regional.to_string(), "regional");
        assert!(Feed::National.resample_on_fetch());
        assert!(!Feed::Regional.resample_on_fetch());
    }
}
