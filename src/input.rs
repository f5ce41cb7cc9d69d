//! Stream source: parses input lines into requests on its own task

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::request::{ParserRegistry, Request};

/// Capacity of the internal line-to-request channel. Once full, the read
/// loop blocks instead of buffering the rest of the input.
const READ_BUFFER: usize = 10;

/// Producer of parsed requests
///
/// The read loop runs concurrently with the consumer, connected by a
/// bounded channel; a slow consumer exerts backpressure on reading.
/// Empty and malformed lines are skipped with a log note and never
/// terminate the stream.
pub struct StreamSource {
    rx: mpsc::Receiver<Request>,
}

impl StreamSource {
    /// Open the configured input (stdin or a file) and start the read loop
    ///
    /// Fails fast on a missing input file or an unknown input format, before
    /// any worker exists.
    pub async fn open(config: &Config, registry: ParserRegistry) -> Result<(Self, JoinHandle<()>)> {
        if !registry.contains(&config.input_format) {
            return Err(Error::Input(format!(
                "unknown input format: {}",
                config.input_format
            )));
        }

        if config.is_stdin() {
            Ok(Self::from_reader(tokio::io::stdin(), config.clone(), registry))
        } else {
            let file = tokio::fs::File::open(&config.input).await.map_err(|e| {
                Error::Input(format!("open input file {}: {e}", config.input))
            })?;
            Ok(Self::from_reader(file, config.clone(), registry))
        }
    }

    /// Start a read loop over an arbitrary reader (tests feed cursors here)
    pub fn from_reader(
        reader: impl AsyncRead + Send + Unpin + 'static,
        config: Config,
        registry: ParserRegistry,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(READ_BUFFER);

        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            let mut line_no: u64 = 0;

            loop {
                line_no += 1;
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        tracing::info!(lines = line_no - 1, "input stream finished");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(line_no, error = %e, "input stream unreadable, stopping");
                        break;
                    }
                };

                let line = line.trim();
                if line.is_empty() {
                    tracing::debug!(line_no, "empty line, skipped");
                    continue;
                }

                match registry.parse(&config.input_format, &config, line) {
                    Some(Ok(mut request)) => {
                        request.line_no = line_no;
                        // Consumer gone: nothing left to feed.
                        if tx.send(request).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(line_no, data = line, error = %e, "build request failed, skipped");
                    }
                    None => {
                        // Format checked before spawn; unreachable in practice.
                        tracing::error!(format = %config.input_format, "parser missing, stopping");
                        break;
                    }
                }
            }
        });

        (Self { rx }, handle)
    }

    /// Receive the next request, in input-line order
    ///
    /// Returns `None` exactly once, permanently, after the input is
    /// exhausted.
    pub async fn next(&mut self) -> Option<Request> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::INPUT_FORMAT_JSON;
    use std::io::Cursor;

    fn url_config() -> Config {
        Config::default()
    }

    fn json_config() -> Config {
        Config {
            input_format: INPUT_FORMAT_JSON.to_string(),
            ..Default::default()
        }
    }

    async fn drain(source: &mut StreamSource) -> Vec<Request> {
        let mut out = Vec::new();
        while let Some(request) = source.next().await {
            out.push(request);
        }
        out
    }

    #[tokio::test]
    async fn test_lines_delivered_in_order() {
        let input = "http://a.test/1\nhttp://a.test/2\nhttp://a.test/3\n";
        let (mut source, handle) =
            StreamSource::from_reader(Cursor::new(input.to_owned()), url_config(), ParserRegistry::new());

        let requests = drain(&mut source).await;
        handle.await.unwrap();

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].line_no, 1);
        assert_eq!(requests[1].line_no, 2);
        assert_eq!(requests[2].line_no, 3);
        assert_eq!(requests[2].url.path(), "/3");
    }

    #[tokio::test]
    async fn test_empty_and_malformed_lines_skipped() {
        let input = "\nhttp://a.test/1\n   \nnot a url\nhttp://a.test/2\n";
        let (mut source, handle) =
            StreamSource::from_reader(Cursor::new(input.to_owned()), url_config(), ParserRegistry::new());

        let requests = drain(&mut source).await;
        handle.await.unwrap();

        assert_eq!(requests.len(), 2);
        // Line numbers reflect the raw input, skips included.
        assert_eq!(requests[0].line_no, 2);
        assert_eq!(requests[1].line_no, 5);
    }

    #[tokio::test]
    async fn test_exhaustion_is_permanent() {
        let (mut source, handle) = StreamSource::from_reader(
            Cursor::new(String::new()),
            url_config(),
            ParserRegistry::new(),
        );

        assert!(source.next().await.is_none());
        assert!(source.next().await.is_none());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_json_mixed_valid_and_malformed() {
        let input = "{broken\n{\"url\":\"http://a.test/ok\"}\n";
        let (mut source, handle) =
            StreamSource::from_reader(Cursor::new(input.to_owned()), json_config(), ParserRegistry::new());

        let requests = drain(&mut source).await;
        handle.await.unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/ok");
        assert_eq!(requests[0].line_no, 2);
    }

    #[tokio::test]
    async fn test_open_rejects_unknown_format() {
        let config = Config {
            input_format: "csv".to_string(),
            ..Default::default()
        };
        let result = StreamSource::open(&config, ParserRegistry::new()).await;
        assert!(matches!(result, Err(Error::Input(_))));
    }

    #[tokio::test]
    async fn test_open_rejects_missing_file() {
        let config = Config {
            input: "/nonexistent/path/to/requests.txt".to_string(),
            ..Default::default()
        };
        let result = StreamSource::open(&config, ParserRegistry::new()).await;
        assert!(matches!(result, Err(Error::Input(_))));
    }
}
