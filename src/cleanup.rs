use std::fmt::Write as _;
use std::fs;

use camino::Utf8Path;
use serde::Serialize;

use crate::domain::GeoSeriesAccession;
use crate::error::KiraError;
use crate::pipeline::{ProgressEvent, ProgressSink};
use crate::stage::{Stage, StageStatus};
use crate::store::{Store, find_files_with_ext, to_utf8};

#[derive(Debug, Clone, Serialize)]
pub struct CleanupManifest {
    pub dataset: String,
    pub generated_at: String,
    pub removed_files: Vec<String>,
}

pub trait ManifestWriter: Send + Sync {
    fn write_manifest(&self, path: &Utf8Path, manifest: &CleanupManifest) -> Result<(), KiraError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadmeWriter;

impl ReadmeWriter {
    pub fn render(manifest: &CleanupManifest) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Pipeline for {} completed successfully.", manifest.dataset);
        let _ = writeln!(out, "Generated at: {}", manifest.generated_at);
        out.push('\n');
        out.push_str("### Steps ###\n");
        out.push_str("1. Download the raw dataset archive\n");
        out.push_str("2. Unpack the tar archive and gzip members\n");
        out.push_str("3. Split each sample file into per-section TSV tables\n");
        out.push_str("4. Remove the raw sample text files\n");
        out.push('\n');
        out.push_str("### Removed files ###\n");
        for path in &manifest.removed_files {
            out.push_str(path);
            out.push('\n');
        }
        out
    }
}

impl ManifestWriter for ReadmeWriter {
    fn write_manifest(
        &self,
        path: &Utf8Path,
        manifest: &CleanupManifest,
    ) -> Result<(), KiraError> {
        Store::write_bytes_atomic(path, Self::render(manifest).as_bytes())
    }
}

pub fn cleanup_raw_files(
    store: &Store,
    writer: &dyn ManifestWriter,
    sink: &dyn ProgressSink,
) -> Result<CleanupManifest, KiraError> {
    let extracted = store.extracted_dir();
    let mut removed_files = Vec::new();
    for raw in find_files_with_ext(extracted.as_std_path(), "txt")? {
        let raw = to_utf8(raw)?;
        fs::remove_file(raw.as_std_path())
            .map_err(|err| KiraError::Filesystem(format!("remove {raw}: {err}")))?;
        sink.event(ProgressEvent::new(
            Stage::Cleanup,
            StageStatus::Running,
            format!("removed raw file {raw}"),
        ));
        removed_files.push(raw.to_string());
    }

    let manifest = build_manifest(store.accession(), removed_files);
    writer.write_manifest(&store.readme_path(), &manifest)?;
    Ok(manifest)
}

fn build_manifest(accession: &GeoSeriesAccession, removed_files: Vec<String>) -> CleanupManifest {
    CleanupManifest {
        dataset: accession.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        removed_files,
    }
}
