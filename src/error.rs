use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

/// Failures that abort a run before any analysis happens.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("{0}")]
    Auth(String),

    #[error("namespace not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Format(String),

    #[error("write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AuditError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditError::Auth(_) => "AuthError",
            AuditError::NotFound(_) => "NotFoundError",
            AuditError::Transient(_) => "TransientError",
            AuditError::Format(_) => "FormatError",
            AuditError::Io { .. } => "IOError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AuditError::Auth("x".into()).kind(), "AuthError");
        assert_eq!(AuditError::NotFound("x".into()).kind(), "NotFoundError");
        assert_eq!(AuditError::Transient("x".into()).kind(), "TransientError");
        assert_eq!(AuditError::Format("x".into()).kind(), "FormatError");
        let io = AuditError::Io {
            path: PathBuf::from("/tmp/state.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(io.kind(), "IOError");
        assert_eq!(io.to_string(), "write /tmp/state.json");
        assert!(std::error::Error::source(&io).is_some());
    }
}
