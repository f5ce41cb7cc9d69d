//! Result sink: durable, append-only destination for Response records

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::response::Response;

/// Append-only writer of Response records
///
/// Opened once for the process lifetime. Each record is written as
/// `<status>\t<json>\n` in one locked write, so lines stay intact under
/// concurrent workers.
pub struct ResultSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ResultSink {
    /// Open (or create) the output file in append mode
    ///
    /// Parent directories are created as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::info!(path = %path.display(), "result sink opened");
        Ok(Self::from_writer(file))
    }

    /// Wrap an arbitrary writer (used by tests)
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Append one Response record
    ///
    /// Any failure here is fatal to the pool: a dropped record means the
    /// accounting contract is broken.
    pub fn append(&self, response: &Response) -> Result<()> {
        let json =
            serde_json::to_string(response).map_err(|e| Error::Sink(e.to_string()))?;
        let line = format!("{}\t{}\n", response.status_code, json);

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| Error::Sink("output writer lock poisoned".into()))?;
        writer
            .write_all(line.as_bytes())
            .map_err(|e| Error::Sink(e.to_string()))?;
        writer.flush().map_err(|e| Error::Sink(e.to_string()))?;

        Ok(())
    }
}

impl std::fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shared in-memory writer for inspecting sink output in tests
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn response(status: i32, line_no: u64) -> Response {
        Response {
            id: "a.test".to_string(),
            url: format!("http://a.test/{line_no}"),
            status_code: status,
            error: String::new(),
            body: "ok".to_string(),
            cost_ms: 1,
            line_no,
        }
    }

    #[test]
    fn test_append_line_format() {
        let buf = SharedBuf::default();
        let sink = ResultSink::from_writer(buf.clone());

        sink.append(&response(200, 1)).unwrap();

        let line = buf.contents();
        assert!(line.starts_with("200\t{"));
        assert!(line.ends_with("}\n"));
        let json = line.trim_end().split('\t').nth(1).unwrap();
        let parsed: Response = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status_code, 200);
        assert_eq!(parsed.line_no, 1);
    }

    #[test]
    fn test_append_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("resp");
        let sink = ResultSink::open(&path).unwrap();

        sink.append(&response(200, 1)).unwrap();
        sink.append(&response(-1, 2)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("200\t"));
        assert!(lines[1].starts_with("-1\t"));
    }

    #[test]
    fn test_concurrent_appends_keep_lines_intact() {
        let buf = SharedBuf::default();
        let sink = Arc::new(ResultSink::from_writer(buf.clone()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.append(&response(200, (t * 50 + i) as u64)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = buf.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 400);
        for line in lines {
            let json = line.split('\t').nth(1).unwrap();
            serde_json::from_str::<Response>(json).unwrap();
        }
    }
}
