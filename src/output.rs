use std::io::{self, Write};

use serde::Serialize;
use tracing::{error, info};

use crate::pipeline::{PipelineReport, ProgressEvent, ProgressSink, StatusReport};
use crate::process::SampleReport;
use crate::stage::StageStatus;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &PipelineReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_status(result: &StatusReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_sample(result: &SampleReport) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        let elapsed_ms = event.elapsed.map(|elapsed| elapsed.as_millis());
        match event.status {
            StageStatus::Failed => error!(
                stage = %event.stage,
                status = %event.status,
                elapsed_ms,
                "{}",
                event.message
            ),
            _ => info!(
                stage = %event.stage,
                status = %event.status,
                elapsed_ms,
                "{}",
                event.message
            ),
        }
    }
}
