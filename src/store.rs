use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::domain::GeoSeriesAccession;
use crate::error::KiraError;

#[derive(Debug, Clone)]
pub struct Store {
    data_dir: Utf8PathBuf,
    accession: GeoSeriesAccession,
}

impl Store {
    pub fn new(data_dir: Utf8PathBuf, accession: GeoSeriesAccession) -> Self {
        Self {
            data_dir,
            accession,
        }
    }

    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    pub fn accession(&self) -> &GeoSeriesAccession {
        &self.accession
    }

    pub fn archive_path(&self) -> Utf8PathBuf {
        self.data_dir.join(format!("{}_RAW.tar", self.accession))
    }

    pub fn dataset_dir(&self) -> Utf8PathBuf {
        self.data_dir.join(self.accession.as_str())
    }

    pub fn extracted_dir(&self) -> Utf8PathBuf {
        self.dataset_dir().join("extracted")
    }

    pub fn processed_dir(&self) -> Utf8PathBuf {
        self.dataset_dir().join("processed")
    }

    pub fn sample_output_dir(&self, sample: &str) -> Utf8PathBuf {
        self.processed_dir().join(sample)
    }

    pub fn readme_path(&self) -> Utf8PathBuf {
        self.dataset_dir().join("readme.txt")
    }

    pub fn ensure_data_dir(&self) -> Result<(), KiraError> {
        fs::create_dir_all(self.data_dir.as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))
    }

    pub fn ensure_dataset_dir(&self) -> Result<(), KiraError> {
        fs::create_dir_all(self.dataset_dir().as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), KiraError> {
        let parent = path
            .parent()
            .ok_or_else(|| KiraError::Filesystem(format!("invalid destination path {path}")))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        let tmp_path = path.with_extension("tmp");
        fs::write(tmp_path.as_std_path(), content)
            .map_err(|err| KiraError::Filesystem(format!("write {tmp_path}: {err}")))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| KiraError::Filesystem(format!("rename into {path}: {err}")))?;
        Ok(())
    }

    pub fn temp_dir_beside(path: &Utf8Path, prefix: &str) -> Result<tempfile::TempDir, KiraError> {
        let parent = path
            .parent()
            .ok_or_else(|| KiraError::Filesystem(format!("invalid destination path {path}")))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        Builder::new()
            .prefix(prefix)
            .tempdir_in(parent.as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))
    }
}

pub fn file_size(path: &Utf8Path) -> Result<Option<u64>, KiraError> {
    match fs::metadata(path.as_std_path()) {
        Ok(meta) => Ok(meta.is_file().then(|| meta.len())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(KiraError::Filesystem(format!("stat {path}: {err}"))),
    }
}

pub fn walk_dir(root: &Path) -> Result<Vec<PathBuf>, KiraError> {
    let mut items = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(path) = stack.pop() {
        let entries = fs::read_dir(&path)
            .map_err(|err| KiraError::Filesystem(format!("read dir {}: {err}", path.display())))?;
        for entry in entries {
            let entry = entry.map_err(|err| KiraError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path.clone());
            }
            items.push(path);
        }
    }
    items.sort();
    Ok(items)
}

pub fn find_files_with_ext(root: &Path, ext: &str) -> Result<Vec<PathBuf>, KiraError> {
    Ok(walk_dir(root)?
        .into_iter()
        .filter(|path| path.is_file() && has_ext(path, ext))
        .collect())
}

pub fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

pub fn atomic_rename_dir(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        fs::remove_dir_all(to)?;
    }
    fs::rename(from, to)
}

pub fn to_utf8(path: PathBuf) -> Result<Utf8PathBuf, KiraError> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| KiraError::Filesystem(format!("non-utf8 path {}", path.display())))
}
