//! Error taxonomy shared by the store and service layers.

use std::fmt::{Display, Formatter};

/// Coarse error category that callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing required input; detected before any store call.
    InvalidArgument,
    /// Identifier does not resolve to a stored entity.
    NotFound,
    /// Uniqueness violation reported by the persistence engine.
    Conflict,
    /// Any other persistence failure.
    Store,
}

impl ErrorKind {
    /// HTTP-equivalent status for the request surface.
    pub fn http_status(self) -> u16 {
        match self {
            Self::InvalidArgument => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Store => 500,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Store => "store_error",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;

    #[test]
    fn status_mapping_matches_request_surface() {
        assert_eq!(ErrorKind::InvalidArgument.http_status(), 400);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::Conflict.http_status(), 409);
        assert_eq!(ErrorKind::Store.http_status(), 500);
    }
}
