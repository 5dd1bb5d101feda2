use std::fmt;

/// Route registration and compilation failures.
///
/// Every variant is a configuration error raised while the routing table is
/// being composed. Nothing here is produced on the match path: an empty result
/// from `find_routes` is a normal "not found" signal, not an error, and an
/// unresolvable `uri_for` lookup returns `None`.
#[derive(Debug)]
#[non_exhaustive]
pub enum RouterError {
    /// A request method was parsed from an empty token.
    UnspecifiedMethod,
    /// A request method token is not a recognized HTTP verb.
    UnknownMethod {
        /// The offending token.
        token: String,
    },
    /// `add_route` was called with an empty uri pattern.
    EmptyUriPattern,
    /// An inline `{name: regex}` expression does not compile.
    ///
    /// This indicates a programming mistake in route setup; it is surfaced
    /// immediately by `compile()` and never retried.
    PatternCompile {
        /// The uri pattern that failed to compile.
        uri_pattern: String,
        /// The underlying regex engine error.
        source: regex::Error,
    },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::UnspecifiedMethod => {
                write!(f, "unspecified request method")
            }
            RouterError::UnknownMethod { token } => {
                write!(f, "unknown request method '{}'", token)
            }
            RouterError::EmptyUriPattern => {
                write!(f, "the uri pattern cannot be empty")
            }
            RouterError::PatternCompile {
                uri_pattern,
                source,
            } => {
                write!(
                    f,
                    "cannot compile uri pattern '{}' to a regex: {}",
                    uri_pattern, source
                )
            }
        }
    }
}

impl std::error::Error for RouterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouterError::PatternCompile { source, .. } => Some(source),
            _ => None,
        }
    }
}
