//! Identifier syntax: `<scheme>://<path>`.
//!
//! The scheme follows RFC 3986 (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`)
//! and is compared case-sensitively. The path is opaque and forwarded verbatim.

use crate::error::RouteError;

const SEPARATOR: &str = "://";

/// True if `scheme` is a syntactically valid URI scheme.
pub fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Splits an identifier into `(scheme, path)`.
///
/// # Example
/// ```
/// use collectvisor::router::split_scheme;
///
/// assert_eq!(split_scheme("netatmo://station/temp").unwrap(), ("netatmo", "station/temp"));
/// assert!(split_scheme("station/temp").is_err());
/// ```
pub fn split_scheme(id: &str) -> Result<(&str, &str), RouteError> {
    match id.split_once(SEPARATOR) {
        Some((scheme, path)) if is_valid_scheme(scheme) => Ok((scheme, path)),
        _ => Err(RouteError::MissingScheme { id: id.to_string() }),
    }
}
