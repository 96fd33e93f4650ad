use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::models::AppointmentRecord;

/// One interaction log row, appended per completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionRow {
    pub timestamp: String,
    pub name: String,
    pub insurance_type: String,
    pub query: String,
    pub response: String,
    pub conversation_state: String,
    pub intent: String,
    pub query_tokens: usize,
    pub response_tokens: usize,
    pub sentiment_label: String,
    pub sentiment_score: f32,
}

/// Append-only CSV persistence for interactions and appointments. Each file
/// gets a header row on first write.
#[derive(Debug, Clone)]
pub struct CsvStore {
    interactions_path: PathBuf,
    appointments_path: PathBuf,
}

impl CsvStore {
    pub fn new(interactions_path: impl Into<PathBuf>, appointments_path: impl Into<PathBuf>) -> Self {
        Self {
            interactions_path: interactions_path.into(),
            appointments_path: appointments_path.into(),
        }
    }

    pub fn append_interaction(&self, row: &InteractionRow) -> anyhow::Result<()> {
        append_row(&self.interactions_path, row)
            .with_context(|| format!("failed to log interaction to {:?}", self.interactions_path))
    }

    pub fn append_appointment(&self, record: &AppointmentRecord) -> anyhow::Result<()> {
        append_row(&self.appointments_path, record)
            .with_context(|| format!("failed to save appointment to {:?}", self.appointments_path))
    }
}

fn append_row<T: Serialize>(path: &Path, row: &T) -> anyhow::Result<()> {
    let write_header = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);
    writer.serialize(row)?;
    writer.flush()?;
    Ok(())
}
