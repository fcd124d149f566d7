//! Errors generated by the synthesis core.
use std::fmt::Display;

/// Convenience wrapper to represent success or failure of a core operation.
pub type TaktResult<T> = Result<T, Error>;

/// Errors generated by the scheduling, binding and allocation pipeline.
///
/// The variants follow the pipeline's error taxonomy: configuration errors
/// ([MalformedStructure](Error::malformed_structure),
/// [InvalidName](Error::invalid_name)) and constraint violations
/// ([Constraint](Error::constraint)) are caller-recoverable; infeasibility
/// ([Infeasible](Error::infeasible)) is surfaced verbatim without retry;
/// internal invariant violations ([Internal](Error::internal)) indicate a
/// bug in the pipeline itself.
pub struct Error {
    kind: Box<ErrorKind>,
}

impl Error {
    /// Caller-supplied data is structurally invalid.
    pub fn malformed_structure<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::MalformedStructure(msg.to_string())),
        }
    }

    /// A name is not a valid identifier.
    pub fn invalid_name<S: ToString>(name: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::InvalidName(name.to_string())),
        }
    }

    /// A requested mutation would break an invariant.
    pub fn constraint<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::Constraint(msg.to_string())),
        }
    }

    /// The problem as posed has no solution under the given bounds.
    pub fn infeasible<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::Infeasible(msg.to_string())),
        }
    }

    /// An operator reachable from the graph inputs is missing latency data.
    pub fn latency_not_set<S: ToString>(op: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::LatencyNotSet(op.to_string())),
        }
    }

    /// Internal invariant violation. Should never surface to a well-formed
    /// caller; logged with full state at the point of construction.
    pub fn internal<S: ToString>(msg: S) -> Self {
        let msg = msg.to_string();
        log::error!("internal invariant violation: {msg}");
        Self {
            kind: Box::new(ErrorKind::Internal(msg)),
        }
    }

    /// A file could not be read or written.
    pub fn invalid_file<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::InvalidFile(msg.to_string())),
        }
    }

    /// An input description failed to parse.
    pub fn parse_error<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::ParseError(msg.to_string())),
        }
    }
}

enum ErrorKind {
    MalformedStructure(String),
    InvalidName(String),
    Constraint(String),
    Infeasible(String),
    LatencyNotSet(String),
    Internal(String),
    InvalidFile(String),
    ParseError(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorKind::*;
        match &*self.kind {
            MalformedStructure(msg) => {
                write!(f, "malformed structure: {msg}")
            }
            InvalidName(name) => {
                write!(f, "`{name}' is not a valid identifier")
            }
            Constraint(msg) => write!(f, "constraint violation: {msg}"),
            Infeasible(msg) => write!(f, "infeasible: {msg}"),
            LatencyNotSet(op) => {
                write!(f, "latencies not set for operation `{op}'")
            }
            Internal(msg) => {
                write!(f, "internal invariant violation: {msg}")
            }
            InvalidFile(msg) => write!(f, "invalid file: {msg}"),
            ParseError(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::invalid_file(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::invalid_file(err)
    }
}
