//! # Source Descriptors
//!
//! Content sources are described by TOML files, one table per source ID:
//!
//! ```toml
//! [unit-world]
//! name = "Unit World"
//! kind = "http"
//! priority = 1
//! expires = "24h"
//! base_url = "https://mirror.example.com/content/"
//! paths = ["fedora/19/x86_64", "fedora/19/i386"]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SourceError;

const DEFAULT_EXPIRES: &str = "24h";
const DEFAULT_MAX_CONCURRENT: usize = 10;

/// The closed set of source kinds. Each kind maps to a cataloger and a
/// transport via the factory; there is no open-ended plugin discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Remote source indexed over HTTP
    Http,
    /// Filesystem-backed source
    Local,
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(SourceKind::Http),
            "local" => Ok(SourceKind::Local),
            other => Err(SourceError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Http => write!(f, "http"),
            SourceKind::Local => write!(f, "local"),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_expires() -> String {
    DEFAULT_EXPIRES.to_string()
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

/// A parsed content source descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Display name
    pub name: String,
    /// Source kind, selects the cataloger and transport
    pub kind: SourceKind,
    /// Disabled sources are skipped at load time
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower priority is tried first
    #[serde(default)]
    pub priority: i32,
    /// How long contributed catalog entries stay fresh, e.g. "30s", "10m", "24h", "7d"
    #[serde(default = "default_expires")]
    pub expires: String,
    /// Base URL used both to index the source and to resolve unit paths
    pub base_url: String,
    /// Optional paths joined onto `base_url`, each indexed separately
    #[serde(default)]
    pub paths: Vec<String>,
    /// Transfer concurrency within one batched download
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl SourceDescriptor {
    /// The catalog entry TTL declared by the descriptor.
    pub fn expires(&self) -> Result<Duration, SourceError> {
        parse_duration(&self.expires)
    }

    /// The list of URLs this source is indexed from: each path joined onto
    /// `base_url`, or the base URL alone when no paths are declared.
    pub fn urls(&self) -> Result<Vec<Url>, SourceError> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;
        if self.paths.is_empty() {
            return Ok(vec![base]);
        }
        let mut urls = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let mut path = path.trim_start_matches('/').to_string();
            if !path.ends_with('/') {
                path.push('/');
            }
            urls.push(base.join(&path)?);
        }
        Ok(urls)
    }

    /// Validate the fields that only fail at use time.
    pub fn validate(&self, id: &str) -> Result<(), SourceError> {
        self.expires().map_err(|e| SourceError::DescriptorError {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        self.urls().map_err(|e| SourceError::DescriptorError {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Parse the contents of one descriptor file: a map of source ID to
/// descriptor.
pub fn parse_descriptors(text: &str) -> Result<BTreeMap<String, SourceDescriptor>, SourceError> {
    toml::from_str(text).map_err(|e| SourceError::Generic(format!("descriptor parse error: {e}")))
}

/// Parse a duration string: a bare number of seconds or a number with an
/// `s`, `m`, `h` or `d` suffix.
pub fn parse_duration(text: &str) -> Result<Duration, SourceError> {
    let text = text.trim();
    let invalid = || SourceError::Generic(format!("invalid duration: {text:?}"));
    if text.is_empty() {
        return Err(invalid());
    }
    let (digits, multiplier) = match text.as_bytes()[text.len() - 1] {
        b's' => (&text[..text.len() - 1], 1),
        b'm' => (&text[..text.len() - 1], 60),
        b'h' => (&text[..text.len() - 1], 3600),
        b'd' => (&text[..text.len() - 1], 86400),
        _ => (text, 1),
    };
    let value: u64 = digits.trim().parse().map_err(|_| invalid())?;
    Ok(Duration::from_secs(value * multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
        [unit-world]
        name = "Unit World"
        kind = "http"
        priority = 1
        expires = "12h"
        base_url = "https://unit-world.example.com/content"

        [underground]
        name = "Underground Content"
        kind = "http"
        priority = 2
        base_url = "https://underground.example.com/"
        paths = ["fedora/19/x86_64", "/fedora/19/i386"]
    "#;

    #[test]
    fn parses_multiple_sources() {
        let sources = parse_descriptors(DESCRIPTOR).unwrap();
        assert_eq!(sources.len(), 2);

        let unit_world = &sources["unit-world"];
        assert_eq!(unit_world.kind, SourceKind::Http);
        assert_eq!(unit_world.priority, 1);
        assert!(unit_world.enabled);
        assert_eq!(unit_world.expires().unwrap(), Duration::from_secs(12 * 3600));
    }

    #[test]
    fn defaults_applied() {
        let sources = parse_descriptors(DESCRIPTOR).unwrap();
        let underground = &sources["underground"];
        assert_eq!(underground.expires().unwrap(), Duration::from_secs(24 * 3600));
        assert_eq!(underground.max_concurrent, 10);
    }

    #[test]
    fn urls_join_paths_to_base() {
        let sources = parse_descriptors(DESCRIPTOR).unwrap();
        let urls = sources["underground"].urls().unwrap();
        assert_eq!(
            urls.iter().map(|u| u.as_str()).collect::<Vec<_>>(),
            [
                "https://underground.example.com/fedora/19/x86_64/",
                "https://underground.example.com/fedora/19/i386/",
            ]
        );
    }

    #[test]
    fn base_url_alone_when_no_paths() {
        let sources = parse_descriptors(DESCRIPTOR).unwrap();
        let urls = sources["unit-world"].urls().unwrap();
        assert_eq!(
            urls.iter().map(|u| u.as_str()).collect::<Vec<_>>(),
            ["https://unit-world.example.com/content/"]
        );
    }

    #[test]
    fn unknown_kind_rejected() {
        let text = r#"
            [bad]
            name = "Bad"
            kind = "ftp"
            base_url = "ftp://bad.example.com/"
        "#;
        assert!(parse_descriptors(text).is_err());
    }

    #[test]
    fn duration_suffixes() {
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604800));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("10w").is_err());
    }
}
