use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use chrono::Local;

pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub module: String,
    pub message: String,
}

/// In-process logger: bounded ring buffer plus an optional file sink.
/// The ring buffer backs the `recent logs` surface; the file survives
/// restarts for post-mortem reading.
pub struct AgentLogger {
    ring_buffer: VecDeque<LogEntry>,
    max_entries: usize,
    file_path: Option<PathBuf>,
}

static LOGGER: OnceLock<Arc<Mutex<AgentLogger>>> = OnceLock::new();

fn get_logger() -> &'static Arc<Mutex<AgentLogger>> {
    LOGGER.get_or_init(|| Arc::new(Mutex::new(AgentLogger::new(500))))
}

impl AgentLogger {
    pub fn new(max_entries: usize) -> Self {
        Self {
            ring_buffer: VecDeque::with_capacity(max_entries),
            max_entries,
            file_path: None,
        }
    }

    pub fn set_file_path(&mut self, path: PathBuf) {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        self.file_path = Some(path);
    }

    pub fn log(&mut self, level: &str, module: &str, message: &str) {
        let entry = LogEntry {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            level: level.to_string(),
            module: module.to_string(),
            message: message.to_string(),
        };

        if let Some(path) = &self.file_path {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(
                    file,
                    "[{}] [{}] [{}] {}",
                    entry.timestamp, entry.level, entry.module, entry.message
                );
            }
        }

        if self.ring_buffer.len() >= self.max_entries {
            self.ring_buffer.pop_front();
        }
        self.ring_buffer.push_back(entry);
    }

    pub fn get_recent(&self, n: usize) -> Vec<String> {
        self.ring_buffer
            .iter()
            .rev()
            .take(n)
            .map(|e| {
                format!(
                    "[{}] [{}] [{}] {}",
                    e.timestamp, e.level, e.module, e.message
                )
            })
            .collect::<Vec<_>>()
    }
}

/// Attach the file sink under the given data directory.
pub fn init(data_dir: PathBuf) {
    let logger = get_logger();
    let mut logger = logger.lock().unwrap();
    logger.set_file_path(data_dir.join("screenpilot.log"));
}

pub fn log(level: &str, module: &str, message: impl Into<String>) {
    let logger = get_logger();
    let mut logger = logger.lock().unwrap();
    logger.log(level, module, &message.into());
}

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::logger::log("DEBUG", module_path!(), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        $crate::logger::log("INFO", module_path!(), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        $crate::logger::log("ERROR", module_path!(), format!($($arg)*))
    };
}

pub fn get_recent_logs(n: usize) -> Vec<String> {
    let logger = get_logger();
    let logger = logger.lock().unwrap();
    logger.get_recent(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_keeps_newest_entries() {
        let mut logger = AgentLogger::new(3);
        for i in 0..5 {
            logger.log("INFO", "test", &format!("entry {}", i));
        }
        let recent = logger.get_recent(10);
        assert_eq!(recent.len(), 3);
        assert!(recent[0].contains("entry 4"));
        assert!(recent[2].contains("entry 2"));
    }

    #[test]
    fn file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("agent.log");
        let mut logger = AgentLogger::new(10);
        logger.set_file_path(path.clone());
        logger.log("ERROR", "test", "something failed");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[ERROR]"));
        assert!(contents.contains("something failed"));
    }
}
