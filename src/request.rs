//! Request model and input-line parsers

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, HOST};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};

use crate::config::{Config, INPUT_FORMAT_JSON, INPUT_FORMAT_URL_LIST_GET};

/// One outbound request, parsed from a single input line
///
/// Immutable once constructed; owned by whichever pipeline stage is
/// currently processing it (source -> queue -> worker).
#[derive(Debug, Clone)]
pub struct Request {
    /// Request identifier; defaults to the URL host when not supplied
    pub id: String,

    /// Validated target URL
    pub url: Url,

    /// Line number within the input stream (assigned by the source)
    pub line_no: u64,

    /// HTTP method
    pub method: Method,

    /// Headers to attach; a `Host` entry overrides the request host
    pub headers: HeaderMap,

    /// Request body, if any
    pub body: Option<String>,
}

/// Errors produced while turning an input line into a [`Request`]
///
/// Recoverable: the line is skipped and the stream continues.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Line is not a valid URL
    #[error("invalid url: {0}")]
    Url(String),

    /// Unrecognized HTTP method
    #[error("invalid method: {0}")]
    Method(String),

    /// Header name or value is not representable
    #[error("invalid header: {0}")]
    Header(String),

    /// Line is not valid JSON for the `json` format
    #[error("invalid json line: {0}")]
    Json(#[from] serde_json::Error),
}

/// A parser turns one trimmed input line into a request
pub type ParserFn = fn(&Config, &str) -> Result<Request, ParseError>;

/// Registry of input-line parsers, keyed by format name
///
/// The mapping is static and known at startup; formats beyond the built-ins
/// can be registered before the stream source starts.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    handlers: HashMap<String, ParserFn>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    /// Create a registry with the built-in formats registered
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        registry.register(INPUT_FORMAT_URL_LIST_GET, parse_url_list_get);
        registry.register(INPUT_FORMAT_JSON, parse_json);
        registry
    }

    /// Register (or replace) a parser for a format name
    pub fn register(&mut self, name: &str, parser: ParserFn) {
        self.handlers.insert(name.to_string(), parser);
    }

    /// Whether a format name is known
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Parse one line with the parser registered for `format`
    ///
    /// Returns `None` if the format itself is unknown; callers treat that
    /// as a configuration error, not a per-line parse error.
    pub fn parse(
        &self,
        format: &str,
        config: &Config,
        line: &str,
    ) -> Option<Result<Request, ParseError>> {
        self.handlers.get(format).map(|parser| parser(config, line))
    }
}

/// `url_list_get`: the line is a literal URL, sent as a GET request
fn parse_url_list_get(_config: &Config, line: &str) -> Result<Request, ParseError> {
    let url = Url::parse(line).map_err(|e| ParseError::Url(e.to_string()))?;
    let id = url.host_str().unwrap_or_default().to_string();

    Ok(Request {
        id,
        url,
        line_no: 0,
        method: Method::GET,
        headers: HeaderMap::new(),
        body: None,
    })
}

/// Line schema for the `json` input format
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JsonRequestLine {
    /// Request identifier; falls back to the URL host when empty
    #[serde(default)]
    pub id: String,

    /// HTTP method, case-insensitive; empty means GET
    #[serde(default)]
    pub method: String,

    /// Target URL
    pub url: String,

    /// Headers; a `Host` entry overrides the request host
    #[serde(default)]
    pub header: HashMap<String, String>,

    /// Request body
    #[serde(default)]
    pub body: String,
}

/// `json`: the line is a JSON object `{id, method, url, header, body}`
fn parse_json(_config: &Config, line: &str) -> Result<Request, ParseError> {
    let data: JsonRequestLine = serde_json::from_str(line)?;

    let url = Url::parse(&data.url).map_err(|e| ParseError::Url(e.to_string()))?;

    let method = if data.method.is_empty() {
        Method::GET
    } else {
        Method::from_bytes(data.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ParseError::Method(data.method.clone()))?
    };

    let mut headers = HeaderMap::new();
    for (name, value) in &data.header {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ParseError::Header(name.clone()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| ParseError::Header(value.clone()))?;
        headers.insert(name, value);
    }

    let id = if data.id.is_empty() {
        url.host_str().unwrap_or_default().to_string()
    } else {
        data.id
    };

    let body = if data.body.is_empty() {
        None
    } else {
        Some(data.body)
    };

    Ok(Request {
        id,
        url,
        line_no: 0,
        method,
        headers,
        body,
    })
}

/// Whether the request carries an explicit `Host` override
pub fn host_override(request: &Request) -> Option<&HeaderValue> {
    request.headers.get(HOST)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn test_url_list_get_parses_get_request() {
        let registry = ParserRegistry::new();
        let request = registry
            .parse(INPUT_FORMAT_URL_LIST_GET, &config(), "http://127.0.0.1:8089/user/get/1")
            .unwrap()
            .unwrap();

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url.as_str(), "http://127.0.0.1:8089/user/get/1");
        assert_eq!(request.id, "127.0.0.1");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_url_list_get_rejects_garbage() {
        let registry = ParserRegistry::new();
        let result = registry
            .parse(INPUT_FORMAT_URL_LIST_GET, &config(), "not a url at all")
            .unwrap();
        assert!(matches!(result, Err(ParseError::Url(_))));
    }

    #[test]
    fn test_json_full_record() {
        let registry = ParserRegistry::new();
        let line = r#"{"id":"update_uid_1","method":"post","url":"http://127.0.0.1:8088/user/save/1","header":{"Content-Type":"application/x-www-form-urlencoded"},"body":"name=HanMeiMei&age=12"}"#;
        let request = registry
            .parse(INPUT_FORMAT_JSON, &config(), line)
            .unwrap()
            .unwrap();

        assert_eq!(request.id, "update_uid_1");
        assert_eq!(request.method, Method::POST);
        assert_eq!(
            request.headers.get("content-type").unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.body.as_deref(), Some("name=HanMeiMei&age=12"));
    }

    #[test]
    fn test_json_id_defaults_to_host() {
        let registry = ParserRegistry::new();
        let line = r#"{"url":"http://a.test/1"}"#;
        let request = registry
            .parse(INPUT_FORMAT_JSON, &config(), line)
            .unwrap()
            .unwrap();
        assert_eq!(request.id, "a.test");
        assert_eq!(request.method, Method::GET);
    }

    #[test]
    fn test_json_host_header_override() {
        let registry = ParserRegistry::new();
        let line = r#"{"url":"http://10.0.0.1/ping","header":{"Host":"backend.internal"}}"#;
        let request = registry
            .parse(INPUT_FORMAT_JSON, &config(), line)
            .unwrap()
            .unwrap();
        assert_eq!(
            host_override(&request).unwrap(),
            &HeaderValue::from_static("backend.internal")
        );
    }

    #[test]
    fn test_json_malformed_line() {
        let registry = ParserRegistry::new();
        let result = registry
            .parse(INPUT_FORMAT_JSON, &config(), "{not json")
            .unwrap();
        assert!(matches!(result, Err(ParseError::Json(_))));
    }

    #[test]
    fn test_json_bad_method() {
        let registry = ParserRegistry::new();
        let line = r#"{"url":"http://a.test/1","method":"b@d"}"#;
        let result = registry.parse(INPUT_FORMAT_JSON, &config(), line).unwrap();
        assert!(matches!(result, Err(ParseError::Method(_))));
    }

    #[test]
    fn test_unknown_format() {
        let registry = ParserRegistry::new();
        assert!(registry
            .parse("csv", &config(), "http://a.test/1")
            .is_none());
        assert!(!registry.contains("csv"));
        assert!(registry.contains(INPUT_FORMAT_JSON));
    }

    #[test]
    fn test_register_custom_format() {
        fn ping(_config: &Config, _line: &str) -> Result<Request, ParseError> {
            parse_url_list_get(_config, "http://ping.test/")
        }

        let mut registry = ParserRegistry::new();
        registry.register("ping", ping);
        let request = registry.parse("ping", &config(), "anything").unwrap().unwrap();
        assert_eq!(request.id, "ping.test");
    }
}
