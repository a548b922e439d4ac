use std::fs;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::error::KiraError;
use crate::pipeline::{ProgressEvent, ProgressSink};
use crate::projector::{REDUCED_PROBES, reduce_probes};
use crate::stage::{Stage, StageStatus};
use crate::store::{Store, find_files_with_ext, to_utf8};
use crate::table::{TableSet, parse_sections};

#[derive(Debug, Clone, Serialize)]
pub struct SampleReport {
    pub sample: String,
    pub source: String,
    pub output_dir: String,
    pub tables: Vec<String>,
}

pub fn process_extracted(
    store: &Store,
    probe_columns_to_drop: &[String],
    sink: &dyn ProgressSink,
) -> Result<Vec<SampleReport>, KiraError> {
    let extracted = store.extracted_dir();
    let raw_files = find_files_with_ext(extracted.as_std_path(), "txt")?;
    if raw_files.is_empty() {
        return Err(KiraError::Filesystem(format!(
            "no raw sample files under {extracted}"
        )));
    }

    fs::create_dir_all(store.processed_dir().as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;

    let mut reports = Vec::with_capacity(raw_files.len());
    for raw in raw_files {
        let raw = to_utf8(raw)?;
        let sample = sample_name(&raw);
        sink.event(ProgressEvent::new(
            Stage::Process,
            StageStatus::Running,
            format!("parsing {raw}"),
        ));
        let output_dir = store.sample_output_dir(&sample);
        let tables = process_file(raw.as_std_path(), &output_dir, probe_columns_to_drop)?;
        reports.push(SampleReport {
            sample,
            source: raw.to_string(),
            output_dir: output_dir.to_string(),
            tables,
        });
    }
    Ok(reports)
}

pub fn process_file(
    path: &Path,
    output_dir: &Utf8Path,
    probe_columns_to_drop: &[String],
) -> Result<Vec<String>, KiraError> {
    let bytes = fs::read(path)
        .map_err(|err| KiraError::Filesystem(format!("read {}: {err}", path.display())))?;
    let text = String::from_utf8(bytes).map_err(|err| {
        let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
        KiraError::SourceEncoding {
            path: path.display().to_string(),
            line: valid.iter().filter(|&&byte| byte == b'\n').count() + 1,
        }
    })?;
    let tables = parse_sections(&text)?;

    let mut written = write_table_set(&tables, output_dir)?;
    if let Some(reduced) = reduce_probes(&tables, probe_columns_to_drop) {
        let target = table_path(output_dir, REDUCED_PROBES);
        Store::write_bytes_atomic(&target, reduced.to_tsv().as_bytes())?;
        written.push(REDUCED_PROBES.to_string());
    }
    Ok(written)
}

pub fn write_table_set(tables: &TableSet, output_dir: &Utf8Path) -> Result<Vec<String>, KiraError> {
    fs::create_dir_all(output_dir.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    let mut written = Vec::with_capacity(tables.len());
    for (name, table) in tables.iter() {
        let target = table_path(output_dir, name);
        Store::write_bytes_atomic(&target, table.to_tsv().as_bytes())?;
        written.push(name.to_string());
    }
    Ok(written)
}

pub fn table_path(output_dir: &Utf8Path, section: &str) -> Utf8PathBuf {
    output_dir.join(format!("{}.tsv", table_file_stem(section)))
}

fn table_file_stem(section: &str) -> String {
    let cleaned: String = section
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "unnamed".to_string(),
        _ => cleaned,
    }
}

fn sample_name(raw: &Utf8Path) -> String {
    raw.file_stem().unwrap_or(raw.as_str()).to_string()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn invalid_utf8_fails_without_writing_tables() {
        let temp = tempfile::tempdir().unwrap();
        let raw = temp.path().join("GSM1.txt");
        fs::write(&raw, b"[Probes]\nID\tName\n1\tfo\xff\xfeo\n").unwrap();
        let out = Utf8PathBuf::from_path_buf(temp.path().join("out")).unwrap();

        let err = process_file(&raw, &out, &[]).unwrap_err();

        assert_matches!(err, KiraError::SourceEncoding { line: 3, .. });
        assert!(!out.as_std_path().exists());
    }

    #[test]
    fn section_names_cannot_escape_output_dir() {
        let dir = Utf8Path::new("out");
        assert_eq!(table_path(dir, "../etc"), Utf8PathBuf::from("out/.._etc.tsv"));
        assert_eq!(table_path(dir, ""), Utf8PathBuf::from("out/unnamed.tsv"));
        assert_eq!(table_path(dir, "Probes"), Utf8PathBuf::from("out/Probes.tsv"));
    }
}
