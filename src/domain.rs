use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeoSeriesAccession(String);

impl GeoSeriesAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn series_prefix(&self) -> SeriesPrefix {
        let digits = self.0.trim_start_matches("GSE");
        if digits.len() <= 3 {
            return SeriesPrefix("GSEnnn".to_string());
        }
        let head = &digits[..digits.len() - 3];
        SeriesPrefix(format!("GSE{head}nnn"))
    }
}

impl fmt::Display for GeoSeriesAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GeoSeriesAccession {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        if !accession_regex().is_match(&normalized) {
            return Err(KiraError::InvalidExpressionAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesPrefix(String);

impl SeriesPrefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SeriesPrefix {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        if !prefix_regex().is_match(&normalized) {
            return Err(KiraError::InvalidSeriesPrefix(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

fn accession_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^GSE[0-9]+$").expect("valid accession regex"))
}

fn prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^GSE[0-9]*nnn$").expect("valid prefix regex"))
}
