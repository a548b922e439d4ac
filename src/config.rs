use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{GeoSeriesAccession, SeriesPrefix};
use crate::error::KiraError;
use crate::projector::default_probe_columns_to_drop;

pub const DEFAULT_CONFIG_FILE: &str = "kira-gp.json";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DATASET: &str = "GSE68849";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub probe_columns_to_drop: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub data_dir: Option<String>,
    pub dataset: Option<String>,
    pub series: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_dir: Utf8PathBuf,
    pub dataset: GeoSeriesAccession,
    pub series: SeriesPrefix,
    pub probe_columns_to_drop: Vec<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config: Config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| KiraError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let data_dir = overrides
            .data_dir
            .or(config.data_dir)
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let dataset: GeoSeriesAccession = overrides
            .dataset
            .or(config.dataset)
            .unwrap_or_else(|| DEFAULT_DATASET.to_string())
            .parse()?;
        let series = match overrides.series.or(config.series) {
            Some(value) => value.parse()?,
            None => dataset.series_prefix(),
        };

        Ok(ResolvedConfig {
            schema_version,
            data_dir: Utf8PathBuf::from(data_dir),
            dataset,
            series,
            probe_columns_to_drop: config
                .probe_columns_to_drop
                .unwrap_or_else(default_probe_columns_to_drop),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let resolved =
            ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.data_dir, Utf8PathBuf::from("data"));
        assert_eq!(resolved.dataset.as_str(), "GSE68849");
        assert_eq!(resolved.series.as_str(), "GSE68nnn");
        assert_eq!(resolved.probe_columns_to_drop, default_probe_columns_to_drop());
    }
}
