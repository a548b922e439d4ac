use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cleanup::{ManifestWriter, ReadmeWriter, cleanup_raw_files};
use crate::config::ResolvedConfig;
use crate::domain::SeriesPrefix;
use crate::error::KiraError;
use crate::fs_util::{ArchiveExtractor, TarGzExtractor};
use crate::geo::{GeoClient, raw_archive_url};
use crate::process::process_extracted;
use crate::stage::{Stage, StageStatus};
use crate::store::{Store, atomic_rename_dir, file_size};

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub status: StageStatus,
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(stage: Stage, status: StageStatus, message: impl Into<String>) -> Self {
        Self {
            stage,
            status,
            message: message.into(),
            elapsed: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub series: SeriesPrefix,
    pub probe_columns_to_drop: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageAction {
    Ran,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub action: StageAction,
    pub output: String,
    pub detail: Option<String>,
    pub elapsed_ms: Option<u128>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub dataset: String,
    pub target: Stage,
    pub stages: Vec<StageOutcome>,
}

impl PipelineReport {
    pub fn ran(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages
            .iter()
            .filter(|outcome| outcome.action == StageAction::Ran)
            .map(|outcome| outcome.stage)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageState {
    pub stage: Stage,
    pub requires: Option<Stage>,
    pub output: String,
    pub complete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub dataset: String,
    pub stages: Vec<StageState>,
}

pub struct Pipeline<G: GeoClient, E: ArchiveExtractor, M: ManifestWriter> {
    store: Store,
    settings: PipelineSettings,
    geo: G,
    extractor: E,
    writer: M,
}

impl<G: GeoClient> Pipeline<G, TarGzExtractor, ReadmeWriter> {
    pub fn from_config(config: &ResolvedConfig, geo: G) -> Self {
        let store = Store::new(config.data_dir.clone(), config.dataset.clone());
        let settings = PipelineSettings {
            series: config.series.clone(),
            probe_columns_to_drop: config.probe_columns_to_drop.clone(),
        };
        Self::new(store, settings, geo, TarGzExtractor, ReadmeWriter)
    }
}

impl<G: GeoClient, E: ArchiveExtractor, M: ManifestWriter> Pipeline<G, E, M> {
    pub fn new(store: Store, settings: PipelineSettings, geo: G, extractor: E, writer: M) -> Self {
        Self {
            store,
            settings,
            geo,
            extractor,
            writer,
        }
    }

    pub fn run(&self, target: Stage, sink: &dyn ProgressSink) -> Result<PipelineReport, KiraError> {
        let mut stages = Vec::new();
        for stage in target.chain() {
            let output = stage.output(&self.store).to_string();
            sink.event(ProgressEvent::new(
                stage,
                StageStatus::Pending,
                format!("checking {output}"),
            ));

            if stage.is_complete(&self.store)? {
                sink.event(ProgressEvent::new(
                    stage,
                    StageStatus::Done,
                    "already complete; skipping",
                ));
                stages.push(StageOutcome {
                    stage,
                    action: StageAction::Skipped,
                    output,
                    detail: None,
                    elapsed_ms: None,
                });
                continue;
            }

            let start = Instant::now();
            let detail = self.run_stage(stage, sink)?;
            stages.push(StageOutcome {
                stage,
                action: StageAction::Ran,
                output,
                detail: Some(detail),
                elapsed_ms: Some(start.elapsed().as_millis()),
            });
        }

        Ok(PipelineReport {
            dataset: self.store.accession().to_string(),
            target,
            stages,
        })
    }

    // runs even when `stage` is already complete
    pub fn run_stage(&self, stage: Stage, sink: &dyn ProgressSink) -> Result<String, KiraError> {
        if let Some(dependency) = stage.requires() {
            if !dependency.is_complete(&self.store)? {
                return Err(KiraError::DependencyIncomplete { stage, dependency });
            }
        }

        sink.event(ProgressEvent::new(stage, StageStatus::Running, "starting"));
        let start = Instant::now();
        let result = match stage {
            Stage::Download => self.download(sink),
            Stage::Extract => self.extract(sink),
            Stage::Process => self.process(sink),
            Stage::Cleanup => self.cleanup(sink),
        };

        let detail = match result {
            Ok(detail) => detail,
            Err(err) => {
                sink.event(
                    ProgressEvent::new(stage, StageStatus::Failed, err.to_string())
                        .with_elapsed(start.elapsed()),
                );
                return Err(err);
            }
        };

        if !stage.is_complete(&self.store)? {
            let err = KiraError::StageIncomplete(stage);
            sink.event(
                ProgressEvent::new(stage, StageStatus::Failed, err.to_string())
                    .with_elapsed(start.elapsed()),
            );
            return Err(err);
        }

        sink.event(
            ProgressEvent::new(stage, StageStatus::Done, detail.clone())
                .with_elapsed(start.elapsed()),
        );
        Ok(detail)
    }

    pub fn status(&self) -> Result<StatusReport, KiraError> {
        let stages = Stage::ALL
            .into_iter()
            .map(|stage| {
                Ok(StageState {
                    stage,
                    requires: stage.requires(),
                    output: stage.output(&self.store).to_string(),
                    complete: stage.is_complete(&self.store)?,
                })
            })
            .collect::<Result<Vec<_>, KiraError>>()?;
        Ok(StatusReport {
            dataset: self.store.accession().to_string(),
            stages,
        })
    }

    fn download(&self, sink: &dyn ProgressSink) -> Result<String, KiraError> {
        self.store.ensure_data_dir()?;
        let url = raw_archive_url(self.store.accession(), &self.settings.series);
        let archive = self.store.archive_path();
        sink.event(ProgressEvent::new(
            Stage::Download,
            StageStatus::Running,
            format!("geo.request {url}"),
        ));

        let temp = tempfile::Builder::new()
            .prefix("kira-gp-download")
            .tempfile_in(self.store.data_dir().as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        let start = Instant::now();
        self.geo.download_url(&url, temp.path())?;
        sink.event(ProgressEvent::new(
            Stage::Download,
            StageStatus::Running,
            format!("geo.response latency_ms={}", start.elapsed().as_millis()),
        ));
        temp.persist(archive.as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;

        let size = file_size(&archive)?.unwrap_or(0);
        Ok(format!("downloaded {size} bytes to {archive}"))
    }

    fn extract(&self, sink: &dyn ProgressSink) -> Result<String, KiraError> {
        self.store.ensure_dataset_dir()?;
        let archive = self.store.archive_path();
        let extracted = self.store.extracted_dir();
        let temp_dir = Store::temp_dir_beside(&extracted, "kira-gp-extract")?;

        let raw_files = self.extractor.extract(archive.as_std_path(), temp_dir.path())?;
        if raw_files.is_empty() {
            return Err(KiraError::Archive(format!("{archive} holds no sample files")));
        }
        for raw in &raw_files {
            let relative = raw.strip_prefix(temp_dir.path()).unwrap_or(raw.as_path());
            sink.event(ProgressEvent::new(
                Stage::Extract,
                StageStatus::Running,
                format!("unpacked {}", relative.display()),
            ));
        }

        atomic_rename_dir(temp_dir.path(), extracted.as_std_path())
            .map_err(|err| KiraError::Filesystem(format!("rename into {extracted}: {err}")))?;
        Ok(format!("extracted {} raw sample files", raw_files.len()))
    }

    fn process(&self, sink: &dyn ProgressSink) -> Result<String, KiraError> {
        let samples = process_extracted(&self.store, &self.settings.probe_columns_to_drop, sink)?;
        let tables: usize = samples.iter().map(|sample| sample.tables.len()).sum();
        Ok(format!("wrote {tables} tables for {} samples", samples.len()))
    }

    fn cleanup(&self, sink: &dyn ProgressSink) -> Result<String, KiraError> {
        let manifest = cleanup_raw_files(&self.store, &self.writer, sink)?;
        Ok(format!(
            "removed {} raw files; manifest at {}",
            manifest.removed_files.len(),
            self.store.readme_path()
        ))
    }
}
