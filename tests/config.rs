use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kira_geo_pipeline::config::{Config, ConfigLoader, ConfigOverrides};
use kira_geo_pipeline::error::KiraError;

#[test]
fn resolve_from_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-gp.json");
    std::fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "data_dir": "/srv/geo",
            "dataset": "GSE102902",
            "probe_columns_to_drop": ["Definition"]
        }"#,
    )
    .unwrap();

    let resolved =
        ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap();
    assert_eq!(resolved.data_dir, Utf8PathBuf::from("/srv/geo"));
    assert_eq!(resolved.dataset.as_str(), "GSE102902");
    assert_eq!(resolved.series.as_str(), "GSE102nnn");
    assert_eq!(resolved.probe_columns_to_drop, vec!["Definition".to_string()]);
}

#[test]
fn overrides_win_over_file_values() {
    let config = Config {
        schema_version: None,
        data_dir: Some("from-file".to_string()),
        dataset: Some("GSE1".to_string()),
        series: None,
        probe_columns_to_drop: None,
    };
    let overrides = ConfigOverrides {
        data_dir: Some("from-cli".to_string()),
        dataset: Some("GSE68849".to_string()),
        series: Some("GSE68nnn".to_string()),
    };

    let resolved = ConfigLoader::resolve_config(config, overrides).unwrap();
    assert_eq!(resolved.data_dir, Utf8PathBuf::from("from-cli"));
    assert_eq!(resolved.dataset.as_str(), "GSE68849");
    assert_eq!(resolved.series.as_str(), "GSE68nnn");
}

#[test]
fn explicit_missing_path_is_an_error() {
    let err = ConfigLoader::resolve(
        Some("/nonexistent/kira-gp.json"),
        ConfigOverrides::default(),
    )
    .unwrap_err();
    assert_matches!(err, KiraError::ConfigRead(_));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-gp.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap_err();
    assert_matches!(err, KiraError::ConfigParse(_));
}

#[test]
fn invalid_series_is_rejected() {
    let config = Config {
        series: Some("GSE68".to_string()),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap_err();
    assert_matches!(err, KiraError::InvalidSeriesPrefix(_));
}
