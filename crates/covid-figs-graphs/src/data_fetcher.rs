//! Fetching of upstream CSV feeds together with their last modification.

use crate::table::{DataTable, TableOptions};
use covid_figs_common::{LastModified, RepositoryClient, Result};
use covid_figs_config::SourceConfig;
use std::fmt;
use tracing::{info, instrument};

/// A fetched CSV table and the time of the commit that last touched it.
#[derive(Debug, Clone)]
pub struct DataSet {
    pub repo: String,
    pub path: String,
    pub commit_url: String,
    pub data_url: String,
    pub last_modified: LastModified,
    pub table: DataTable,
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository: {}", self.repo)?;
        writeln!(f, "Path: {}", self.path)?;
        writeln!(f, "Commit URL: {}", self.commit_url)?;
        writeln!(f, "Last modified: {}", self.last_modified)?;
        writeln!(f, "Data URL: {}", self.data_url)?;
        write!(f, "Rows: {}", self.table.len())
    }
}

/// Upstream repository reader producing [`DataSet`]s.
#[derive(Debug, Clone)]
pub struct DataFetcher {
    client: RepositoryClient,
    options: TableOptions,
}

impl DataFetcher {
    /// Creates a new data fetcher.
    pub fn new(client: RepositoryClient, options: TableOptions) -> Self {
        Self { client, options }
    }

    /// Fetcher for the repository and columns named in `source`.
    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        let client = RepositoryClient::new(source.repository_config()?)?;
        Ok(Self::new(
            client,
            TableOptions {
                date_columns: source.date_columns.clone(),
                index_column: source.index_column.clone(),
            },
        ))
    }

    /// Underlying repository client.
    pub fn client(&self) -> &RepositoryClient {
        &self.client
    }

    /// Fetch `path`: commit history first, then the file itself.
    ///
    /// With `resample` the table is collapsed to one row per calendar day.
    #[instrument(skip(self))]
    pub async fn fetch(&self, path: &str, resample: bool) -> Result<DataSet> {
        let last_modified = self.client.last_modified(path).await?;
        let text = self.client.download(path).await?;

        let mut table = DataTable::from_csv_str(&text, &self.options)?;
        if resample {
            table = table.resample_daily();
        }

        let dataset = DataSet {
            repo: self.client.config().repo.clone(),
            path: path.to_string(),
            commit_url: self.client.commit_url(path),
            data_url: self.client.data_url(path),
            last_modified,
            table,
        };
        info!("Fetched data set\n{}", dataset);
        Ok(dataset)
    }
}
