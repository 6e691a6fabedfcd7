//! The dump source named on the command line.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

const IMAGE_PREFIX: &str = "file:";

/// Hypervisor identifier of one running guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DomainId(u32);

impl DomainId {
    pub fn new(id: u32) -> Self {
        DomainId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TargetParseError {
    #[error("domain id is empty")]
    Empty,
    #[error("invalid domain id '{0}': expected a decimal number or file:<path>")]
    NotNumeric(String),
    #[error("domain id '{0}' does not fit in 32 bits")]
    OutOfRange(String),
    #[error("image path after 'file:' is empty")]
    EmptyImagePath,
}

/// What to dump: a live domain or a memory image on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Domain(DomainId),
    Image(PathBuf),
}

impl FromStr for DomainId {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetParseError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TargetParseError::NotNumeric(s.to_string()));
        }
        s.parse::<u32>()
            .map(DomainId)
            .map_err(|_| TargetParseError::OutOfRange(s.to_string()))
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(IMAGE_PREFIX) {
            Some("") => Err(TargetParseError::EmptyImagePath),
            Some(path) => Ok(Target::Image(PathBuf::from(path))),
            None => s.parse().map(Target::Domain),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::Domain(id) => write!(f, "domain {}", id),
            Target::Image(path) => write!(f, "image {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain_id() {
        assert_eq!("7".parse(), Ok(Target::Domain(DomainId::new(7))));
        assert_eq!(" 42 ".parse(), Ok(Target::Domain(DomainId::new(42))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            "abc".parse::<Target>(),
            Err(TargetParseError::NotNumeric("abc".to_string()))
        );
        assert_eq!(
            "-1".parse::<Target>(),
            Err(TargetParseError::NotNumeric("-1".to_string()))
        );
        assert_eq!("".parse::<Target>(), Err(TargetParseError::Empty));
        assert_eq!(
            "4294967296".parse::<Target>(),
            Err(TargetParseError::OutOfRange("4294967296".to_string()))
        );
    }

    #[test]
    fn test_parse_image() {
        assert_eq!(
            "file:/tmp/mem.raw".parse(),
            Ok(Target::Image(PathBuf::from("/tmp/mem.raw")))
        );
        assert_eq!(
            "file:".parse::<Target>(),
            Err(TargetParseError::EmptyImagePath)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Target::Domain(DomainId::new(3)).to_string(), "domain 3");
        assert_eq!(
            Target::Image(PathBuf::from("a.raw")).to_string(),
            "image a.raw"
        );
    }
}
