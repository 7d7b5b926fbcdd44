//! JSON summary of a run: where each area's overview was published.

use covid_figs_common::{format_iso_seconds, LastModified, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Published overview of one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaReport {
    /// `s3://bucket/key` of the latest overview.
    pub url: String,
    /// HTTPS URL of the same object.
    pub public_url: String,
    /// Upstream modification time, RFC 3339 with offset and whole seconds.
    pub last_modified: String,
}

impl AreaReport {
    pub fn new(url: String, public_url: String, last_modified: &LastModified) -> Self {
        Self {
            url,
            public_url,
            last_modified: format_iso_seconds(last_modified),
        }
    }
}

/// Area key to published overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunReport {
    pub areas: BTreeMap<String, AreaReport>,
}

impl RunReport {
    pub fn insert(&mut self, area: impl Into<String>, report: AreaReport) {
        self.areas.insert(area.into(), report);
    }

    pub fn get(&self, area: &str) -> Option<&AreaReport> {
        self.areas.get(area)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_json_shape() {
        let last_modified = chrono_tz::Europe::Rome
            .with_ymd_and_hms(2020, 4, 2, 18, 30, 5)
            .unwrap();
        let mut report = RunReport::default();
        report.insert(
            "lombardia",
            AreaReport::new(
                "s3://figs/lombardia-overview.png".to_string(),
                "https://figs.s3.amazonaws.com/lombardia-overview.png".to_string(),
                &last_modified,
            ),
        );

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(
            json["lombardia"]["url"],
            "s3://figs/lombardia-overview.png"
        );
        assert_eq!(
            json["lombardia"]["last_modified"],
            "2020-04-02T18:30:05+02:00"
        );
        assert_eq!(report.len(), 1);
    }
}
