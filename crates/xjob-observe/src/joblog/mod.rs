//! Per-trigger job log files backing the `/log` endpoint.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    thread,
};

use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use xjob_core::JobLogStore;
use xjob_model::LogResult;

enum Op {
    Line { path: PathBuf, line: String },
    Flush(oneshot::Sender<()>),
}

/// Stores each trigger's log at `<root>/<yyyy-mm-dd>/<log_id>.log`.
///
/// The date is the UTC day of the trigger's `log_date_time` (epoch millis).
/// Appends are queued to one writer thread, so callers on the runtime never
/// touch the disk and lines keep their order. The thread exits when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct FileJobLog {
    root: PathBuf,
    tx: mpsc::UnboundedSender<Op>,
}

impl FileJobLog {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name("xjob-joblog".into())
            .spawn(move || writer(rx))?;
        Ok(Self {
            root: root.into(),
            tx,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, log_date_time: i64, log_id: i64) -> PathBuf {
        self.root
            .join(day_dir(log_date_time))
            .join(format!("{log_id}.log"))
    }

    /// Resolves once every line appended before the call is on disk.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Op::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

fn writer(mut rx: mpsc::UnboundedReceiver<Op>) {
    while let Some(op) = rx.blocking_recv() {
        match op {
            Op::Line { path, line } => {
                if let Err(e) = write_line(&path, &line) {
                    warn!(path = %path.display(), error = %e, "job log write failed");
                }
            }
            Op::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("job log writer stopped");
}

fn write_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line.trim_end_matches('\n'));
    buf.push('\n');
    file.write_all(buf.as_bytes())
}

impl JobLogStore for FileJobLog {
    fn append(&self, log_id: i64, log_date_time: i64, line: &str) {
        let op = Op::Line {
            path: self.path_of(log_date_time, log_id),
            line: line.to_string(),
        };
        if self.tx.send(op).is_err() {
            warn!(log_id, "job log writer is gone, line dropped");
        }
    }

    fn read(&self, log_date_time: i64, log_id: i64, from_line: i32) -> LogResult {
        let path = self.path_of(log_date_time, log_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(log_id, path = %path.display(), error = %e, "job log read failed");
                }
                String::new()
            }
        };
        page(&content, from_line)
    }
}

/// Lines `from_line..=last` of `content`, numbered from 1.
fn page(content: &str, from_line: i32) -> LogResult {
    let lines: Vec<&str> = content.lines().collect();
    let to_line = i32::try_from(lines.len()).unwrap_or(i32::MAX);
    let skip = usize::try_from(from_line.max(1) - 1).unwrap_or(0);

    LogResult {
        from_line_num: from_line,
        to_line_num: to_line,
        log_content: lines
            .iter()
            .skip(skip)
            .copied()
            .collect::<Vec<_>>()
            .join("\n"),
        is_end: true,
    }
}

fn day_dir(log_date_time: i64) -> String {
    let nanos = i128::from(log_date_time) * 1_000_000;
    let date = OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-11-14T22:13:20Z
    const TRIGGERED_AT: i64 = 1_700_000_000_000;

    #[test]
    fn path_uses_trigger_day() {
        let log = FileJobLog::new("/tmp/jobs").unwrap();
        assert_eq!(
            log.path_of(TRIGGERED_AT, 42),
            PathBuf::from("/tmp/jobs/2023-11-14/42.log")
        );
        assert_eq!(day_dir(0), "1970-01-01");
    }

    #[tokio::test]
    async fn append_then_read_from_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileJobLog::new(dir.path()).unwrap();

        log.append(7, TRIGGERED_AT, "first");
        log.append(7, TRIGGERED_AT, "second\n");
        log.append(7, TRIGGERED_AT, "third");
        log.flush().await;

        let all = log.read(TRIGGERED_AT, 7, 1);
        assert_eq!(all.log_content, "first\nsecond\nthird");
        assert_eq!(all.to_line_num, 3);
        assert!(all.is_end);

        let tail = log.read(TRIGGERED_AT, 7, 2);
        assert_eq!(tail.from_line_num, 2);
        assert_eq!(tail.log_content, "second\nthird");
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileJobLog::new(dir.path()).unwrap();

        let res = log.read(TRIGGERED_AT, 99, 1);
        assert_eq!(res.to_line_num, 0);
        assert!(res.log_content.is_empty());
        assert!(res.is_end);
    }

    #[test]
    fn from_line_past_end_returns_nothing() {
        let res = page("a\nb\n", 5);
        assert_eq!(res.to_line_num, 2);
        assert_eq!(res.log_content, "");

        let res = page("a\nb\n", 0);
        assert_eq!(res.log_content, "a\nb");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn queued_appends_keep_order_across_clones() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileJobLog::new(dir.path()).unwrap();
        let other = log.clone();

        for i in 0..200 {
            let target = if i % 2 == 0 { &log } else { &other };
            target.append(5, TRIGGERED_AT, &format!("line {i}"));
        }
        other.flush().await;

        let res = log.read(TRIGGERED_AT, 5, 1);
        assert_eq!(res.to_line_num, 200);
        let expected: Vec<String> = (0..200).map(|i| format!("line {i}")).collect();
        assert_eq!(res.log_content, expected.join("\n"));
    }
}
