//! JSONL journal of received files, written at the destination root

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const JOURNAL_FILE: &str = ".ferry_journal.jsonl";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Completed,
    Failed,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct JournalEntry {
    pub timestamp: String,
    pub session_id: String,
    pub name: String,
    pub bytes: u64,
    pub status: EntryStatus,
}

pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(dest_root: &Path) -> Self {
        Journal {
            path: dest_root.join(JOURNAL_FILE),
        }
    }

    pub fn add_entry(&self, entry: JournalEntry) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("open journal file")?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &entry)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_log(&self) -> Result<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).context("open journal file for reading")?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: JournalEntry = serde_json::from_str(&line)?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_round_trip_through_jsonl() {
        let tmp = tempfile::tempdir().unwrap();
        let journal = Journal::new(tmp.path());
        journal
            .add_entry(JournalEntry {
                timestamp: "2025-01-01T00:00:00Z".to_string(),
                session_id: "s1".to_string(),
                name: "mydir/a.txt".to_string(),
                bytes: 5,
                status: EntryStatus::Completed,
            })
            .unwrap();
        journal
            .add_entry(JournalEntry {
                timestamp: "2025-01-01T00:00:01Z".to_string(),
                session_id: "s1".to_string(),
                name: "mydir/b.bin".to_string(),
                bytes: 0,
                status: EntryStatus::Failed,
            })
            .unwrap();

        let entries = journal.read_log().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "mydir/a.txt");
        assert_eq!(entries[0].status, EntryStatus::Completed);
        assert_eq!(entries[1].bytes, 0);
        assert_eq!(entries[1].status, EntryStatus::Failed);
    }

    #[test]
    fn missing_journal_reads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Journal::new(tmp.path()).read_log().unwrap().is_empty());
    }
}
