//! Integration tests for configuration loading from disk.

use covid_figs_common::{Feed, FigsError, LogFormat};
use covid_figs_config::ConfigLoader;
use std::collections::HashMap;
use std::io::Write;

#[test]
fn test_load_full_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
source:
  timezone: Europe/Rome
storage:
  bucket_name: figs-bucket
  prefix: covid-figs
  region: eu-west-1
areas:
  - name: Veneto
    feed: regional
    region: Veneto
  - name: Italia
    feed: national
charts:
  growth_y_limit: [0.0, 3.0]
output:
  save_csv: true
logging:
  level: debug
  format: json
"#
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(file.path()).unwrap();

    assert_eq!(config.storage.region.as_deref(), Some("eu-west-1"));
    assert_eq!(config.areas[0].name, "Veneto");
    assert_eq!(config.areas[1].feed, Feed::National);
    assert_eq!(config.charts.growth_y_limit, Some([0.0, 3.0]));
    assert!(config.output.save_csv);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::load_from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, FigsError::Config { .. }));
}

#[test]
fn test_file_without_bucket_fails_validation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "output:\n  save_csv: false").unwrap();

    let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, FigsError::Validation { .. }));
}

#[test]
fn test_explicit_path_still_takes_env_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "storage:\n  prefix: from-file\noutput:\n  save_csv: true").unwrap();
    let env = HashMap::from([
        ("NSP_S3_BUCKET_NAME", "legacy-bucket"),
        ("NSP_S3_PREFIX", "legacy-prefix"),
        ("COVID_FIGS_SAVE_FIGURES", "true"),
    ]);

    let config = ConfigLoader::load_with(Some(file.path()), |var| {
        env.get(var).map(|v| (*v).to_string())
    })
    .unwrap();

    assert_eq!(config.storage.bucket_name, "legacy-bucket");
    assert_eq!(config.storage.prefix, "legacy-prefix");
    assert!(config.output.save_csv);
    assert!(config.output.save_figures);
}

#[test]
fn test_config_path_variable_is_read_through_lookup() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "storage:\n  bucket_name: from-file").unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let config = ConfigLoader::load_with(None, |var| {
        (var == "COVID_FIGS_CONFIG_PATH").then(|| path.clone())
    })
    .unwrap();

    assert_eq!(config.storage.bucket_name, "from-file");
}
