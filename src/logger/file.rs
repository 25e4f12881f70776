/// Daily log file output
///
/// Lines are appended to `<logs dir>/bullion_fetcher_<YYYY-MM-DD>.log`. The
/// file is reopened under the new name on the first write after local
/// midnight. Until `init_file_logging` succeeds every write is a no-op, which
/// keeps library users and tests off the filesystem.
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::paths;

struct DailyLog {
    dir: PathBuf,
    date: NaiveDate,
    writer: BufWriter<File>,
}

impl DailyLog {
    fn open(dir: &Path, date: NaiveDate) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(log_file_name(date)))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            date,
            writer: BufWriter::new(file),
        })
    }

    /// Switch to the file for `today` if the date has moved on
    fn roll_to(&mut self, today: NaiveDate) -> io::Result<()> {
        if today == self.date {
            return Ok(());
        }
        let _ = self.writer.flush();
        *self = Self::open(&self.dir, today)?;
        Ok(())
    }

    fn write_line(&mut self, today: NaiveDate, line: &str) -> io::Result<()> {
        if let Err(e) = self.roll_to(today) {
            eprintln!("Failed to roll log file to {}: {}", log_file_name(today), e);
        }
        writeln!(self.writer, "{}", line)
    }
}

static LOG_FILE: Lazy<Mutex<Option<DailyLog>>> = Lazy::new(|| Mutex::new(None));

fn log_file_name(date: NaiveDate) -> String {
    format!("bullion_fetcher_{}.log", date.format("%Y-%m-%d"))
}

pub fn init_file_logging() {
    let logs_dir = paths::get_logs_directory();
    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Failed to create logs directory {}: {}", logs_dir.display(), e);
        return;
    }

    let today = Local::now().date_naive();
    match DailyLog::open(&logs_dir, today) {
        Ok(log) => {
            if let Ok(mut slot) = LOG_FILE.lock() {
                *slot = Some(log);
            }
        }
        Err(e) => eprintln!(
            "Failed to open log file {}: {}",
            logs_dir.join(log_file_name(today)).display(),
            e
        ),
    }
}

pub fn write_to_file(line: &str) {
    if let Ok(mut slot) = LOG_FILE.lock() {
        if let Some(log) = slot.as_mut() {
            let _ = log.write_line(Local::now().date_naive(), line);
        }
    }
}

pub fn flush_file_logging() {
    if let Ok(mut slot) = LOG_FILE.lock() {
        if let Some(log) = slot.as_mut() {
            let _ = log.writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_file_name_carries_date() {
        assert_eq!(log_file_name(day(9)), "bullion_fetcher_2024-03-09.log");
    }

    #[test]
    fn test_write_after_midnight_opens_next_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = DailyLog::open(dir.path(), day(9)).unwrap();

        log.write_line(day(9), "before").unwrap();
        log.write_line(day(10), "after").unwrap();
        log.writer.flush().unwrap();

        let first = fs::read_to_string(dir.path().join(log_file_name(day(9)))).unwrap();
        let second = fs::read_to_string(dir.path().join(log_file_name(day(10)))).unwrap();
        assert_eq!(first, "before\n");
        assert_eq!(second, "after\n");
        assert_eq!(log.date, day(10));
    }

    #[test]
    fn test_same_day_appends_to_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = DailyLog::open(dir.path(), day(9)).unwrap();
        log.write_line(day(9), "one").unwrap();
        log.write_line(day(9), "two").unwrap();
        log.writer.flush().unwrap();

        let content = fs::read_to_string(dir.path().join(log_file_name(day(9)))).unwrap();
        assert_eq!(content, "one\ntwo\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
