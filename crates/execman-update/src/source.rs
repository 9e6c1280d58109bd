//! Source identifier parsing
//!
//! Accepted shapes (scheme and host optional):
//! `https://github.com/owner/project@v1.2.0`, `github.com/owner/project`,
//! `owner/project@v1.2.0`, `owner/project`.

use execman_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Host assumed when a source names none
pub const DEFAULT_HOST: &str = "github.com";

/// A parsed source identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceSpec {
    /// Forge host, e.g. "github.com"
    pub host: String,
    /// Repository owner
    pub owner: String,
    /// Repository / project name
    pub project: String,
    /// Pinned release tag, if any
    pub version: Option<String>,
}

impl SourceSpec {
    /// Parse a free-form source identifier
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();

        let without_scheme = match raw.find("://") {
            Some(idx) => &raw[idx + 3..],
            None => raw,
        };

        let (location, version) = match without_scheme.split_once('@') {
            Some((location, version)) => {
                let version = version.trim();
                (
                    location,
                    (!version.is_empty()).then(|| version.to_string()),
                )
            }
            None => (without_scheme, None),
        };

        let mut segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();

        let host = match segments.first() {
            Some(first) if looks_like_host(first) => {
                let host = first.to_ascii_lowercase();
                segments.remove(0);
                host
            }
            _ => DEFAULT_HOST.to_string(),
        };

        if segments.len() < 2 {
            return Err(Error::invalid_source(
                input,
                "expected owner/project after removing scheme, host and version",
            ));
        }

        let owner = segments[0].to_string();
        let project = segments[1]
            .strip_suffix(".git")
            .unwrap_or(segments[1])
            .to_string();

        if project.is_empty() {
            return Err(Error::invalid_source(input, "project name is empty"));
        }

        Ok(Self {
            host,
            owner,
            project,
            version,
        })
    }

    /// Canonical form without the pinned version, as stored in the registry
    pub fn unpinned(&self) -> String {
        format!("{}/{}/{}", self.host, self.owner, self.project)
    }

    /// Same source with a different (or no) pin
    pub fn with_version(&self, version: Option<String>) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }
}

/// A first segment is treated as a host when it has a dot or a port, or is localhost
fn looks_like_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment.eq_ignore_ascii_case("localhost")
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unpinned())?;
        if let Some(version) = &self.version {
            write!(f, "@{}", version)?;
        }
        Ok(())
    }
}

impl FromStr for SourceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(input: &str) -> (String, String, Option<String>) {
        let spec = SourceSpec::parse(input).unwrap();
        (spec.owner, spec.project, spec.version)
    }

    #[test]
    fn test_accepted_shapes() {
        let expected = ("acme".to_string(), "tool".to_string(), None);
        assert_eq!(parts("acme/tool"), expected);
        assert_eq!(parts("github.com/acme/tool"), expected);
        assert_eq!(parts("https://github.com/acme/tool"), expected);
        assert_eq!(parts("http://github.com/acme/tool/"), expected);
        assert_eq!(parts("github.com/acme/tool.git"), expected);
    }

    #[test]
    fn test_version_suffix() {
        assert_eq!(
            parts("https://forge.example/acme/tool@v2.0.0"),
            ("acme".to_string(), "tool".to_string(), Some("v2.0.0".to_string()))
        );
        assert_eq!(
            parts("acme/tool@v0.3.1-rc.1"),
            ("acme".to_string(), "tool".to_string(), Some("v0.3.1-rc.1".to_string()))
        );
    }

    #[test]
    fn test_empty_version_is_unpinned() {
        assert_eq!(parts("acme/tool@").2, None);
    }

    #[test]
    fn test_host_is_remembered() {
        let spec = SourceSpec::parse("https://forge.example/acme/tool@v2.0.0").unwrap();
        assert_eq!(spec.host, "forge.example");
        assert_eq!(spec.to_string(), "forge.example/acme/tool@v2.0.0");
        assert_eq!(spec.unpinned(), "forge.example/acme/tool");

        let spec = SourceSpec::parse("localhost:8080/acme/tool").unwrap();
        assert_eq!(spec.host, "localhost:8080");
    }

    #[test]
    fn test_default_host() {
        let spec = SourceSpec::parse("acme/tool").unwrap();
        assert_eq!(spec.to_string(), "github.com/acme/tool");
    }

    #[test]
    fn test_canonical_round_trip() {
        let spec = SourceSpec::parse("https://github.com/acme/tool@v1.2.0").unwrap();
        let reparsed: SourceSpec = spec.to_string().parse().unwrap();
        assert_eq!(spec, reparsed);
    }

    #[test]
    fn test_extra_segments_ignored() {
        assert_eq!(
            parts("github.com/acme/tool/releases/latest"),
            ("acme".to_string(), "tool".to_string(), None)
        );
    }

    #[test]
    fn test_invalid_sources() {
        for input in ["", "tool", "github.com/acme", "https://github.com/", "@v1.0.0", "acme/.git"] {
            let err = SourceSpec::parse(input).unwrap_err();
            assert!(
                matches!(err, Error::InvalidSource { .. }),
                "expected InvalidSource for {input:?}, got {err:?}"
            );
        }
    }
}
