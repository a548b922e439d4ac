use std::fmt;

use camino::Utf8PathBuf;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;
use crate::fs_util::has_pending_gz;
use crate::store::{Store, file_size, find_files_with_ext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Download,
    Extract,
    Process,
    Cleanup,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Download,
        Stage::Extract,
        Stage::Process,
        Stage::Cleanup,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::Extract => "extract",
            Stage::Process => "process",
            Stage::Cleanup => "cleanup",
        }
    }

    pub fn requires(self) -> Option<Stage> {
        match self {
            Stage::Download => None,
            Stage::Extract => Some(Stage::Download),
            Stage::Process => Some(Stage::Extract),
            Stage::Cleanup => Some(Stage::Process),
        }
    }

    // earliest ancestor first
    pub fn chain(self) -> Vec<Stage> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(dependency) = current.requires() {
            chain.push(dependency);
            current = dependency;
        }
        chain.reverse();
        chain
    }

    pub fn output(self, store: &Store) -> Utf8PathBuf {
        match self {
            Stage::Download => store.archive_path(),
            Stage::Extract => store.extracted_dir(),
            Stage::Process => store.processed_dir(),
            Stage::Cleanup => store.readme_path(),
        }
    }

    pub fn is_complete(self, store: &Store) -> Result<bool, KiraError> {
        let output = self.output(store);
        match self {
            Stage::Download | Stage::Cleanup => {
                Ok(file_size(&output)?.is_some_and(|size| size > 0))
            }
            Stage::Extract => {
                // published by a single rename, so existence is enough; cleanup
                // may leave it empty
                let dir = output.as_std_path();
                if !dir.is_dir() {
                    return Ok(false);
                }
                Ok(!has_pending_gz(dir)?)
            }
            Stage::Process => {
                let dir = output.as_std_path();
                if !dir.is_dir() {
                    return Ok(false);
                }
                Ok(!find_files_with_ext(dir, "tsv")?.is_empty())
            }
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Pending => write!(f, "pending"),
            StageStatus::Running => write!(f, "running"),
            StageStatus::Done => write!(f, "done"),
            StageStatus::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_starts_at_download() {
        assert_eq!(Stage::Cleanup.chain(), Stage::ALL.to_vec());
        assert_eq!(Stage::Download.chain(), vec![Stage::Download]);
        assert_eq!(Stage::Process.chain().len(), 3);
    }

    #[test]
    fn value_enum_names_match_display() {
        for stage in Stage::ALL {
            let value = stage.to_possible_value().unwrap();
            assert_eq!(value.get_name(), stage.to_string());
        }
    }
}
