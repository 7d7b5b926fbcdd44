//! Boundary validation of a loaded configuration.

use crate::schema::Config;
use covid_figs_common::{parse_timezone, Feed, FigsError, Result};
use std::collections::HashSet;
use url::Url;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        Self::validate_source(config)?;
        Self::validate_storage(config)?;
        Self::validate_areas(config)?;
        Self::validate_charts(config)?;
        Ok(())
    }

    fn validate_source(config: &Config) -> Result<()> {
        let source = &config.source;
        for (field, value) in [
            ("source.api_base_url", &source.api_base_url),
            ("source.raw_base_url", &source.raw_base_url),
        ] {
            Url::parse(value).map_err(|e| {
                FigsError::validation_field(format!("'{value}' is not a valid URL: {e}"), field)
            })?;
        }
        if source.repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
            return Err(FigsError::validation_field(
                format!("Repository '{}' must look like owner/name", source.repo),
                "source.repo",
            ));
        }
        if !source.date_columns.contains(&source.index_column) {
            return Err(FigsError::validation_field(
                format!(
                    "Index column '{}' must be one of the date columns",
                    source.index_column
                ),
                "source.index_column",
            ));
        }
        if source.timeout_seconds == 0 {
            return Err(FigsError::validation_field(
                "Timeout must be greater than 0",
                "source.timeout_seconds",
            ));
        }
        parse_timezone(&source.timezone)?;
        Ok(())
    }

    fn validate_storage(config: &Config) -> Result<()> {
        if config.storage.bucket_name.trim().is_empty() {
            return Err(FigsError::validation_field(
                "Bucket name cannot be empty",
                "storage.bucket_name",
            ));
        }
        Ok(())
    }

    fn validate_areas(config: &Config) -> Result<()> {
        if config.areas.is_empty() {
            return Err(FigsError::validation_field(
                "At least one area must be configured",
                "areas",
            ));
        }

        let mut slugs = HashSet::new();
        for area in &config.areas {
            if area.name.trim().is_empty() {
                return Err(FigsError::validation_field("Area name cannot be empty", "areas.name"));
            }
            if !slugs.insert(area.slug()) {
                return Err(FigsError::validation_field(
                    format!("Area '{}' collides with another area's file name", area.name),
                    "areas.name",
                ));
            }
            if area.feed == Feed::Regional && area.region.as_deref().map_or(true, str::is_empty) {
                return Err(FigsError::validation_field(
                    format!("Regional area '{}' must name a region", area.name),
                    "areas.region",
                ));
            }
        }
        Ok(())
    }

    fn validate_charts(config: &Config) -> Result<()> {
        let charts = &config.charts;
        for (field, value) in [
            ("charts.lookback", charts.lookback),
            ("charts.window", charts.window),
            ("charts.span", charts.span),
        ] {
            if value == 0 {
                return Err(FigsError::validation_field("Must be greater than 0", field));
            }
        }
        for (field, value) in [
            ("charts.figure_width", charts.figure_width),
            ("charts.figure_height", charts.figure_height),
            ("charts.overview_width", charts.overview_width),
            ("charts.overview_height", charts.overview_height),
        ] {
            if value < 100 {
                return Err(FigsError::validation_field("Must be at least 100 pixels", field));
            }
        }
        if let Some([min, max]) = charts.growth_y_limit {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(FigsError::validation_field(
                    format!("Y range [{min}, {max}] must be finite and increasing"),
                    "charts.growth_y_limit",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AreaConfig;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.storage.bucket_name = "figs-bucket".to_string();
        config
    }

    fn field_of(err: FigsError) -> String {
        match err {
            FigsError::Validation { field: Some(field), .. } => field,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_default_config_requires_bucket() {
        let err = Config::default().validate().unwrap_err();
        assert_eq!(field_of(err), "storage.bucket_name");
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = valid_config();
        config.charts.window = 0;
        assert_eq!(field_of(config.validate().unwrap_err()), "charts.window");
    }

    #[test]
    fn test_inverted_y_limit_rejected() {
        let mut config = valid_config();
        config.charts.growth_y_limit = Some([5.0, 0.0]);
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "charts.growth_y_limit"
        );

        config.charts.growth_y_limit = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let mut config = valid_config();
        config.source.timezone = "Italy/Rome".to_string();
        assert_eq!(field_of(config.validate().unwrap_err()), "timezone");
    }

    #[test]
    fn test_area_rules() {
        let mut config = valid_config();
        config.areas = vec![];
        assert_eq!(field_of(config.validate().unwrap_err()), "areas");

        let mut config = valid_config();
        config.areas.push(AreaConfig::national("LOMBARDIA"));
        assert_eq!(field_of(config.validate().unwrap_err()), "areas.name");

        let mut config = valid_config();
        config.areas[0].region = None;
        assert_eq!(field_of(config.validate().unwrap_err()), "areas.region");
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let mut config = valid_config();
        config.source.api_base_url = "not a url".to_string();
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "source.api_base_url"
        );
    }
}
