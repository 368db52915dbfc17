//! Append-only audit journal
//!
//! Each save cycle's [`SaveCycleReport`] is appended to a line-delimited JSON
//! file (JSONL), one [`AuditRecord`] per line.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BudgetError, BudgetResult};

use super::cascade::SaveCycleReport;
use super::record::AuditRecord;

/// Writes audit records to the journal file
pub struct AuditJournal {
    log_path: PathBuf,
}

impl AuditJournal {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append every entry of a save cycle, flushing once at the end
    ///
    /// Returns the number of records written.
    pub fn record(&self, report: &SaveCycleReport) -> BudgetResult<usize> {
        let records: Vec<AuditRecord> = report.entries().map(AuditRecord::from).collect();
        self.append(&records)?;
        Ok(records.len())
    }

    /// Append records, flushing once at the end
    pub fn append(&self, records: &[AuditRecord]) -> BudgetResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BudgetError::Io(format!("Failed to open audit journal: {}", e)))?;

        for record in records {
            let json = serde_json::to_string(record)
                .map_err(|e| BudgetError::Json(format!("Failed to serialize audit record: {}", e)))?;

            writeln!(file, "{}", json)
                .map_err(|e| BudgetError::Io(format!("Failed to write audit record: {}", e)))?;
        }

        file.flush()
            .map_err(|e| BudgetError::Io(format!("Failed to flush audit journal: {}", e)))?;

        debug!(count = records.len(), path = %self.log_path.display(), "Audit records appended");
        Ok(())
    }

    /// Read all records, oldest first
    pub fn read_all(&self) -> BudgetResult<Vec<AuditRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| BudgetError::Io(format!("Failed to open audit journal: {}", e)))?;

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                BudgetError::Io(format!("Failed to read audit journal line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let record: AuditRecord = serde_json::from_str(&line).map_err(|e| {
                BudgetError::Json(format!(
                    "Failed to parse audit record at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            records.push(record);
        }

        Ok(records)
    }

    /// Read the most recent `count` records
    pub fn read_recent(&self, count: usize) -> BudgetResult<Vec<AuditRecord>> {
        let mut all = self.read_all()?;
        let start = all.len().saturating_sub(count);
        Ok(all.split_off(start))
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
