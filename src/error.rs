use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::stage::Stage;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid GEO series accession: {0}")]
    InvalidExpressionAccession(String),

    #[error("invalid GEO series prefix: {0}")]
    InvalidSeriesPrefix(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("GEO request failed: {0}")]
    GeoHttp(String),

    #[error("GEO returned status {status}: {message}")]
    GeoStatus { status: u16, message: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error(
        "corrupt section [{section}] at line {line}: expected {expected} columns, found {found}"
    )]
    #[diagnostic(help("the sample file is damaged upstream; re-extract the archive"))]
    SourceCorruption {
        section: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("sample file {path} is not valid UTF-8 (line {line})")]
    #[diagnostic(help("the sample file is damaged upstream; re-extract the archive"))]
    SourceEncoding { path: String, line: usize },

    #[error("stage {stage} cannot run before {dependency} is complete")]
    DependencyIncomplete { stage: Stage, dependency: Stage },

    #[error("stage {0} finished but its output does not pass the completion check")]
    #[diagnostic(help("inspect the stage output and remove it before re-running"))]
    StageIncomplete(Stage),
}
