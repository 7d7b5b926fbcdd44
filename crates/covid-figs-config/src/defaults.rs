//! Default values matching the published Italian feeds.

use crate::schema::*;
use covid_figs_common::LoggingConfig;

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            storage: StorageConfig::default(),
            areas: vec![AreaConfig::regional("Lombardia"), AreaConfig::national("Italia")],
            charts: ChartsConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo: "pcm-dpc/COVID-19".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            branch: "master".to_string(),
            regional_path: "dati-regioni/dpc-covid19-ita-regioni.csv".to_string(),
            national_path: "dati-andamento-nazionale/dpc-covid19-ita-andamento-nazionale.csv"
                .to_string(),
            timezone: "Europe/Rome".to_string(),
            user_agent: concat!("covid-figs/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 30,
            date_columns: vec!["data".to_string()],
            index_column: "data".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket_name: String::new(),
            prefix: String::new(),
            region: None,
            public_read: true,
        }
    }
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            figure_width: 1600,
            figure_height: 1000,
            overview_width: 2000,
            overview_height: 1600,
            lookback: 1,
            window: 3,
            span: 3,
            growth_y_limit: Some([0.0, 5.0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covid_figs_common::Feed;

    #[test]
    fn test_default_areas() {
        let config = Config::default();
        assert_eq!(config.areas.len(), 2);
        assert_eq!(config.areas[0].region.as_deref(), Some("Lombardia"));
        assert_eq!(config.areas[1].feed, Feed::National);
        assert_eq!(config.feeds(), vec![Feed::Regional, Feed::National]);
    }

    #[test]
    fn test_default_paths() {
        let source = SourceConfig::default();
        assert_eq!(
            source.path_for(Feed::Regional),
            "dati-regioni/dpc-covid19-ita-regioni.csv"
        );
        let repo = source.repository_config().unwrap();
        assert_eq!(repo.timezone, chrono_tz::Europe::Rome);
    }
}
