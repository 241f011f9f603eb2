//! Common constants used throughout the crate.
//!
//! Tests that are testing the content of an error code or message should not use these constants;
//! they should use hard-coded strings so the tests are also testing for misspellings.
//!
//! Please keep this file organized alphabetically. (This can be a bit hard with comments, etc.)

/// Authorization scheme name for HTTP signatures. Also used as the `WWW-Authenticate` challenge.
pub(crate) const AUTH_SCHEME_SIGNATURE: &str = "Signature";

/// Default allowed clock skew, in seconds, between the request date and the server clock.
pub(crate) const DEFAULT_CLOCK_SKEW_SECONDS: i64 = 300;

/// Signed header list used when the `headers` parameter is omitted.
pub(crate) const DEFAULT_SIGNED_HEADER: &str = "date";

/// Error code: BadCredentialShape
pub(crate) const ERR_CODE_BAD_CREDENTIAL_SHAPE: &str = "BadCredentialShape";

/// Error code: ExpiredRequest
pub(crate) const ERR_CODE_EXPIRED_REQUEST: &str = "ExpiredRequest";

/// Error code: InternalFailure
pub(crate) const ERR_CODE_INTERNAL_FAILURE: &str = "InternalFailure";

/// Error code: InvalidDate
pub(crate) const ERR_CODE_INVALID_DATE: &str = "InvalidDate";

/// Error code: MalformedSignature
pub(crate) const ERR_CODE_MALFORMED_SIGNATURE: &str = "MalformedSignature";

/// Error code: MissingSignature
pub(crate) const ERR_CODE_MISSING_SIGNATURE: &str = "MissingSignature";

/// Error code: MissingSignedHeader
pub(crate) const ERR_CODE_MISSING_SIGNED_HEADER: &str = "MissingSignedHeader";

/// Error code: RequiredHeaderNotSigned
pub(crate) const ERR_CODE_REQUIRED_HEADER_NOT_SIGNED: &str = "RequiredHeaderNotSigned";

/// Error code: SignatureDoesNotMatch
pub(crate) const ERR_CODE_SIGNATURE_DOES_NOT_MATCH: &str = "SignatureDoesNotMatch";

/// Error code: UnsupportedAlgorithm
pub(crate) const ERR_CODE_UNSUPPORTED_ALGORITHM: &str = "UnsupportedAlgorithm";

/// Header for delivering the request date
pub(crate) const HDR_DATE: &str = "date";

/// IMF-fixdate format used when reporting request dates.
pub(crate) const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Header for delivering the signature outside of `Authorization`
pub(crate) const HDR_SIGNATURE: &str = "signature";

/// Header for delivering an alternate request date (browsers cannot set `Date`)
pub(crate) const HDR_X_DATE: &str = "x-date";

/// Host header name, which falls back to the URI authority.
pub(crate) const HOST: &str = "host";

/// Log tags attached to credential shape failures.
pub const LOG_TAGS_AUTH_CREDENTIALS: &[&str] = &["auth", "credentials"];

/// Log tags attached to resolver and payload validator failures.
pub const LOG_TAGS_AUTH_SIGNATURE: &[&str] = &["auth", "signature"];

/// Error message: `"Bad credentials object received for Signature auth validation"`
pub(crate) const MSG_BAD_CREDENTIALS_OBJECT: &str = "Bad credentials object received for Signature auth validation";

/// Error message: `"Bad signature"`
pub(crate) const MSG_BAD_SIGNATURE: &str = "Bad signature";

/// Error message: `"HTTP authentication header missing signature"`
pub(crate) const MSG_MISSING_SIGNATURE: &str = "HTTP authentication header missing signature";

/// Signature parameter: algorithm
pub(crate) const PARAM_ALGORITHM: &str = "algorithm";

/// Signature parameter: signed header list
pub(crate) const PARAM_HEADERS: &str = "headers";

/// Signature parameter: key identifier
pub(crate) const PARAM_KEY_ID: &str = "keyId";

/// Signature parameter: base64 signature
pub(crate) const PARAM_SIGNATURE: &str = "signature";

/// Pseudo-header for the lowercased method and path (draft-cavage-03 and later).
pub(crate) const REQUEST_TARGET: &str = "(request-target)";

/// Pseudo-header for the full request line (draft-cavage-00 through -02).
pub(crate) const REQUEST_LINE: &str = "request-line";
