//! One complete run: fetch the feeds, render every area, publish, report.

use crate::publisher::ObjectPublisher;
use crate::report::{AreaReport, RunReport};
use covid_figs_common::{Feed, FigsError, LastModified, Result};
use covid_figs_config::{AreaConfig, Config, OutputConfig};
use covid_figs_graphs::{DataFetcher, DataSet, OverviewOptions, OverviewViz};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Regional feed column naming the region of each row.
pub const REGION_COLUMN: &str = "denominazione_regione";

/// Overview of one area ready to be rendered.
#[derive(Debug, Clone)]
pub struct PreparedArea {
    pub key: String,
    pub last_modified: LastModified,
    pub viz: OverviewViz,
}

/// Files written locally for one area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArea {
    pub key: String,
    pub last_modified: LastModified,
    pub overview: PathBuf,
    /// Standalone charts and CSV snapshots, uploaded next to the overview.
    pub snapshots: Vec<PathBuf>,
}

/// Fetch every feed used by the configured areas, once each and in order.
pub async fn fetch_feeds(config: &Config, fetcher: &DataFetcher) -> Result<HashMap<Feed, DataSet>> {
    let mut datasets = HashMap::new();
    for feed in config.feeds() {
        let dataset = fetcher
            .fetch(config.source.path_for(feed), feed.resample_on_fetch())
            .await?;
        datasets.insert(feed, dataset);
    }
    Ok(datasets)
}

/// Select the rows of `area` and build its overview.
pub fn prepare_area(
    area: &AreaConfig,
    dataset: &DataSet,
    options: OverviewOptions,
) -> Result<PreparedArea> {
    let table = match &area.region {
        Some(region) if area.feed == Feed::Regional => {
            dataset.table.filter_eq(REGION_COLUMN, region)?
        }
        _ => dataset.table.clone(),
    };
    if table.is_empty() {
        return Err(FigsError::source_data(format!(
            "No rows for area '{}' in {}",
            area.name, dataset.path
        )));
    }
    debug!(area = %area.name, rows = table.len(), "Selected area rows");

    let viz = OverviewViz::new(&area.name, &table, Some(dataset.last_modified), options)?;
    Ok(PreparedArea {
        key: area.slug(),
        last_modified: dataset.last_modified,
        viz,
    })
}

/// Build the overview of every configured area, in configuration order.
pub fn prepare_areas(
    config: &Config,
    datasets: &HashMap<Feed, DataSet>,
) -> Result<Vec<PreparedArea>> {
    config
        .areas
        .iter()
        .map(|area| {
            let dataset = datasets.get(&area.feed).ok_or_else(|| {
                FigsError::new(format!("Feed {} was not fetched for '{}'", area.feed, area.name))
            })?;
            prepare_area(area, dataset, OverviewOptions::from(&config.charts))
        })
        .collect()
}

/// Render `area` into `workdir`, with the extra files `output` asks for.
pub fn render_area(
    area: &PreparedArea,
    workdir: &Path,
    output: &OutputConfig,
) -> Result<RenderedArea> {
    let viz = area
        .viz
        .clone()
        .with_fig_folder(workdir)
        .with_csv_folder(workdir);
    let overview = viz.save_overview()?;

    let mut extras = Vec::new();
    if output.save_figures {
        extras.extend(viz.save_figures()?);
    }
    if output.save_csv {
        extras.extend(viz.save_csv_snapshots()?);
    }

    Ok(RenderedArea {
        key: area.key.clone(),
        last_modified: area.last_modified,
        overview: overview.latest,
        snapshots: extras.into_iter().map(|pair| pair.latest).collect(),
    })
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| FigsError::storage(format!("No file name in {}", path.display())))
}

/// Upload every rendered file and collect the overview locations.
pub async fn publish_rendered<P>(
    rendered: &[RenderedArea],
    publisher: &P,
    config: &Config,
) -> Result<RunReport>
where
    P: ObjectPublisher + ?Sized,
{
    let public = config.storage.public_read;
    let region = config.storage.region.as_deref();
    let mut report = RunReport::default();

    for area in rendered {
        let stored = publisher
            .upload(&area.overview, file_name(&area.overview)?, public)
            .await?;
        for snapshot in &area.snapshots {
            publisher
                .upload(snapshot, file_name(snapshot)?, public)
                .await?;
        }
        report.insert(
            area.key.clone(),
            AreaReport::new(stored.s3_uri(), stored.public_url(region), &area.last_modified),
        );
    }
    Ok(report)
}

/// Run the job once.
///
/// Nothing is uploaded unless every area rendered. The working directory is
/// removed on every exit path.
#[instrument(skip_all, fields(areas = config.areas.len()))]
pub async fn run_job<P>(config: &Config, fetcher: &DataFetcher, publisher: &P) -> Result<RunReport>
where
    P: ObjectPublisher + ?Sized,
{
    info!("Starting run");
    let datasets = fetch_feeds(config, fetcher).await?;
    let areas = prepare_areas(config, &datasets)?;

    let workdir = tempfile::Builder::new().prefix("covid-figs").tempdir()?;
    let rendered = areas
        .iter()
        .map(|area| render_area(area, workdir.path(), &config.output))
        .collect::<Result<Vec<_>>>()?;

    let report = publish_rendered(&rendered, publisher, config).await?;
    workdir.close()?;

    info!(published = report.len(), "Run finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use covid_figs_common::test_utils::feed_fixtures::*;
    use covid_figs_graphs::{DataTable, TableOptions};

    fn dataset(feed_csv: &str, path: &str) -> DataSet {
        DataSet {
            repo: "pcm-dpc/COVID-19".to_string(),
            path: path.to_string(),
            commit_url: String::new(),
            data_url: String::new(),
            last_modified: chrono_tz::Europe::Rome
                .with_ymd_and_hms(2020, 3, 10, 18, 3, 12)
                .unwrap(),
            table: DataTable::from_csv_str(feed_csv, &TableOptions::default()).unwrap(),
        }
    }

    fn regional() -> DataSet {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        dataset(
            &regional_csv(
                start,
                &[
                    ("Lombardia", increasing_counts(5)),
                    ("Veneto", increasing_counts(3)),
                ],
            ),
            "dati-regioni/dpc-covid19-ita-regioni.csv",
        )
    }

    #[test]
    fn test_prepare_regional_area_filters_rows() {
        let prepared = prepare_area(
            &AreaConfig::regional("Veneto"),
            &regional(),
            OverviewOptions::default(),
        )
        .unwrap();

        assert_eq!(prepared.key, "veneto");
        assert_eq!(prepared.viz.area_name(), "Veneto");
        assert_eq!(prepared.viz.rows()[0].1.series().len(), 3);
    }

    #[test]
    fn test_unknown_region_is_a_source_error() {
        let err = prepare_area(
            &AreaConfig::regional("Molise"),
            &regional(),
            OverviewOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FigsError::Source { .. }));
    }

    #[test]
    fn test_prepare_areas_requires_fetched_feed() {
        let config = Config::default();
        let datasets = HashMap::from([(Feed::Regional, regional())]);
        assert!(prepare_areas(&config, &datasets).is_err());
    }

    #[test]
    fn test_file_name_of_path() {
        assert_eq!(
            file_name(Path::new("/tmp/x/italia-overview.png")).unwrap(),
            "italia-overview.png"
        );
        assert!(file_name(Path::new("/")).is_err());
    }
}
