use anyhow::Result;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

pub trait Logger: Send + Sync {
    fn session_start(&self, _id: Uuid, _peer: &str, _request: &str, _files: usize) {}
    fn file_done(&self, _id: Uuid, _name: &str, _bytes: u64) {}
    fn session_done(&self, _id: Uuid, _seconds: f64) {}
    fn error(&self, _context: &str, _path: &Path, _msg: &str) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }

    fn line(&self, s: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

impl Logger for TextLogger {
    fn session_start(&self, id: Uuid, peer: &str, request: &str, files: usize) {
        self.line(&format!(
            "START session={id} peer={peer} request={request} files={files}"
        ));
    }
    fn file_done(&self, id: Uuid, name: &str, bytes: u64) {
        self.line(&format!("FILE session={id} name={name} bytes={bytes}"));
    }
    fn session_done(&self, id: Uuid, seconds: f64) {
        self.line(&format!("DONE session={id} seconds={seconds:.3}"));
    }
    fn error(&self, context: &str, path: &Path, msg: &str) {
        self.line(&format!("ERROR ctx={} path={} msg={}", context, path.display(), msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_logger_appends_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("events.log");
        let logger = TextLogger::new(&path).unwrap();
        let id = Uuid::new_v4();
        logger.session_start(id, "127.0.0.1:9", "mydir", 2);
        logger.file_done(id, "mydir/a.txt", 5);
        logger.session_done(id, 0.25);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("START"));
        assert!(lines[0].contains("request=mydir"));
        assert!(lines[1].contains("bytes=5"));
        assert!(lines[2].contains("DONE"));
    }
}
