use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{GeoSeriesAccession, SeriesPrefix};
use crate::error::KiraError;

pub trait GeoClient: Send + Sync {
    fn download_url(&self, url: &str, destination: &Path) -> Result<(), KiraError>;
}

#[derive(Clone)]
pub struct GeoHttpClient {
    client: Client,
}

impl GeoHttpClient {
    pub fn new() -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-gp/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::GeoHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| KiraError::GeoHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn write_response_to_file(
        &self,
        mut response: reqwest::blocking::Response,
        destination: &Path,
    ) -> Result<(), KiraError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "GEO request failed".to_string());
            return Err(KiraError::GeoStatus { status, message });
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| KiraError::Filesystem(err.to_string()))?;
        }
        let mut file = fs::File::create(destination)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| KiraError::GeoHttp(err.to_string()))?;
        Ok(())
    }
}

impl GeoClient for GeoHttpClient {
    fn download_url(&self, url: &str, destination: &Path) -> Result<(), KiraError> {
        let url = normalize_url(url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| KiraError::GeoHttp(err.to_string()))?;
        self.write_response_to_file(response, destination)
    }
}

pub fn raw_archive_url(accession: &GeoSeriesAccession, series: &SeriesPrefix) -> String {
    format!(
        "https://ftp.ncbi.nlm.nih.gov/geo/series/{series}/{acc}/suppl/{acc}_RAW.tar",
        acc = accession.as_str()
    )
}

pub fn normalize_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("ftp://ftp.ncbi.nlm.nih.gov/") {
        return format!("https://ftp.ncbi.nlm.nih.gov/{}", rest);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_archive_url_uses_series_prefix() {
        let acc: GeoSeriesAccession = "GSE68849".parse().unwrap();
        assert_eq!(
            raw_archive_url(&acc, &acc.series_prefix()),
            "https://ftp.ncbi.nlm.nih.gov/geo/series/GSE68nnn/GSE68849/suppl/GSE68849_RAW.tar"
        );
    }

    #[test]
    fn ftp_urls_are_rewritten() {
        assert_eq!(
            normalize_url("ftp://ftp.ncbi.nlm.nih.gov/geo/series/x"),
            "https://ftp.ncbi.nlm.nih.gov/geo/series/x"
        );
    }
}
