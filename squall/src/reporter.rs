use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{error, info};
use serde::Serialize;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::query::{QueryReport, SimpleQueryReport};
use crate::time::now_utc;

/// Reporter failures. Unlike query execution errors, these are fatal to a
/// workload run.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output-side contract of the runner: one `report` call per query
/// execution, then exactly one `done` once the workload is finished
/// (including during cancellation drain).
#[async_trait]
pub trait QueryReporter<R>: Send {
    /// Reports the completion of one query execution.
    async fn report(&mut self, query_report: &QueryReport<R>) -> Result<(), ReporterError>;

    /// Signals the completion of the workload run.
    async fn done(&mut self) -> Result<(), ReporterError>;
}

/// No-op reporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankQueryReporter;

#[async_trait]
impl<R: Send + Sync> QueryReporter<R> for BlankQueryReporter {
    async fn report(&mut self, _query_report: &QueryReport<R>) -> Result<(), ReporterError> {
        Ok(())
    }

    async fn done(&mut self) -> Result<(), ReporterError> {
        Ok(())
    }
}

/// Reporter that logs each completion, for demonstration and debugging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogQueryReporter;

#[async_trait]
impl<R: Send + Sync> QueryReporter<R> for LogQueryReporter {
    async fn report(&mut self, query_report: &QueryReport<R>) -> Result<(), ReporterError> {
        match query_report.error() {
            None => info!(
                "[{}] {}: {}",
                query_report.completed_time(),
                query_report.user,
                query_report.query.sql
            ),
            Some(client_error) => error!(
                "[{}] {}: {} failed: {client_error}",
                query_report.completed_time(),
                query_report.user,
                query_report.query.sql
            ),
        }
        Ok(())
    }

    async fn done(&mut self) -> Result<(), ReporterError> {
        info!("finished running the workload");
        Ok(())
    }
}

/// Streaming file reporter: appends one JSON line per report to
/// `<label>-<timestamp>.temp.txt` and renames the file to drop the
/// `.temp` infix on `done`. When no report ever arrives, no file is
/// created.
pub struct FileQueryReporter {
    temp_path: PathBuf,
    final_path: PathBuf,
    file: Option<File>,
}

impl FileQueryReporter {
    pub fn new(directory: impl AsRef<Path>, label: &str) -> FileQueryReporter {
        let timestamp = now_utc().format("%Y%m%dT%H%M%S%.3fZ");
        let stem = format!("{label}-{timestamp}");
        FileQueryReporter {
            temp_path: directory.as_ref().join(format!("{stem}.temp.txt")),
            final_path: directory.as_ref().join(format!("{stem}.txt")),
            file: None,
        }
    }

    /// The path the report file will have after a successful `done`.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    async fn open_lazily(&mut self) -> Result<&mut File, ReporterError> {
        if self.file.is_none() {
            self.file = Some(File::create(&self.temp_path).await?);
        }
        let Some(file) = self.file.as_mut() else {
            unreachable!("file was opened above")
        };
        Ok(file)
    }
}

#[async_trait]
impl<R: Serialize + Clone + Send + Sync> QueryReporter<R> for FileQueryReporter {
    async fn report(&mut self, query_report: &QueryReport<R>) -> Result<(), ReporterError> {
        let mut line = SimpleQueryReport::from_report(query_report).dumps()?;
        line.push('\n');

        let file = self.open_lazily().await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn done(&mut self) -> Result<(), ReporterError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&self.temp_path, &self.final_path).await?;
            info!("report file written to {}", self.final_path.display());
        }
        Ok(())
    }
}
