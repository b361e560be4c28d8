use std::fmt;

use serde::{Deserialize, Serialize};

/// Fatal parse failures. Everything else degrades into a [`Warning`].
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// The container could not be opened as a zip archive at all.
    PackageCorrupt(String),
    /// A configured size or entry-count cap was exceeded while reading.
    LimitExceeded { what: String, limit: u64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::PackageCorrupt(msg) => write!(f, "corrupt package: {msg}"),
            Error::LimitExceeded { what, limit } => {
                write!(f, "package limit exceeded: {what} (limit {limit})")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => Error::Io(io),
            other => Error::PackageCorrupt(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    PartMissing,
    MalformedXml,
    StyleCycle,
    RelationshipUnresolved,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningKind::PartMissing => "part missing",
            WarningKind::MalformedXml => "malformed XML",
            WarningKind::StyleCycle => "style cycle",
            WarningKind::RelationshipUnresolved => "relationship unresolved",
        };
        f.write_str(s)
    }
}

/// A recoverable condition met while parsing. The affected contribution was
/// skipped or defaulted; the rest of the model is intact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub kind: WarningKind,
    pub part: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}: {}", self.kind, self.part, self.message)
    }
}

/// Per-parse warning collector. Each parse owns its own instance.
#[derive(Clone, Debug, Default)]
pub(crate) struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub(crate) fn warn(&mut self, kind: WarningKind, part: &str, message: impl Into<String>) {
        let warning = Warning {
            kind,
            part: part.to_string(),
            message: message.into(),
        };
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub(crate) fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub(crate) fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    #[cfg(test)]
    pub(crate) fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
