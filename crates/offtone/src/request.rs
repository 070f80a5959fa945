//! # Request Identity
//!
//! An intercepted outbound request as seen by the router and the strategies:
//! method, resolved URL, declared content destination, and any headers that
//! must travel with the network fetch.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::error::ProxyError;

/// The declared content destination of an intercepted request, mirroring the
/// host runtime's request classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Top-level navigation to a document
    Document,
    Audio,
    Image,
    Script,
    Style,
    /// Anything without a more specific destination (fetch/XHR, fonts, ...)
    Other,
}

/// An intercepted outbound request
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    /// Extra headers forwarded to the network (auth, range, ...)
    pub headers: HeaderMap,
}

impl ProxyRequest {
    /// Create a GET request for an already-resolved URL
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            destination: Destination::Other,
            headers: HeaderMap::new(),
        }
    }

    /// Create a GET request by parsing an absolute URL string
    pub fn parse(url: impl AsRef<str>) -> Result<Self, ProxyError> {
        Ok(Self::get(Url::parse(url.as_ref())?))
    }

    /// Create a top-level navigation request
    pub fn navigation(url: Url) -> Self {
        Self::get(url).with_destination(Destination::Document)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Add a header to forward with the network fetch; invalid names or
    /// values are silently dropped
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Whether this request can be served by or written to a store at all
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Only http(s) requests participate in caching
    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }

    /// Canonical store key: the full URL exactly as requested
    pub fn exact_key(&self) -> String {
        self.url.as_str().to_string()
    }

    /// Store key variant: the URL path with the query stripped
    pub fn path_key(&self) -> String {
        self.url.path().to_string()
    }

    /// Whether the URL path ends with the given suffix, tolerating one
    /// trailing slash
    pub fn path_ends_with(&self, suffix: &str) -> bool {
        self.url.path().trim_end_matches('/').ends_with(suffix)
    }

    /// The lowercase file extension of the URL path, if any
    pub fn path_extension(&self) -> Option<String> {
        let path = self.url.path();
        let name = path.rsplit('/').next()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(url: &str) -> ProxyRequest {
        ProxyRequest::parse(url).unwrap()
    }

    #[test]
    fn test_keys() {
        let r = req("http://origin.test/api/audio/5/download?session=abc");
        assert_eq!(r.exact_key(), "http://origin.test/api/audio/5/download?session=abc");
        assert_eq!(r.path_key(), "/api/audio/5/download");
    }

    #[test]
    fn test_path_ends_with_tolerates_trailing_slash() {
        assert!(req("http://origin.test/api/audio/5/download").path_ends_with("/download"));
        assert!(req("http://origin.test/api/audio/5/download/").path_ends_with("/download"));
        assert!(!req("http://origin.test/api/audio/5/player").path_ends_with("/download"));
    }

    #[test]
    fn test_path_extension() {
        assert_eq!(req("http://origin.test/static/js/main.js").path_extension(), Some("js".into()));
        assert_eq!(req("http://origin.test/track.MP3").path_extension(), Some("mp3".into()));
        assert_eq!(req("http://origin.test/api/playlists").path_extension(), None);
        assert_eq!(req("http://origin.test/.hidden").path_extension(), None);
    }

    #[test]
    fn test_scheme_gate() {
        assert!(req("https://origin.test/").is_http());
        let r = ProxyRequest::parse("chrome-extension://abcdef/page.html").unwrap();
        assert!(!r.is_http());
    }
}
