use {
    crate::constants::*,
    derive_builder::UninitializedFieldError,
    http::status::StatusCode,
    scratchstack_errors::ServiceError,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    },
    tower::BoxError,
};

/// Error returned when an attempt at validating an HTTP signature fails.
#[derive(Debug)]
#[non_exhaustive]
pub enum SignatureError {
    /// The credential resolver reported a valid signature but did not return a credential.
    BadCredentialShape(/* message */ String),

    /// The request date is outside of the allowed clock skew.
    ExpiredRequest(/* message */ String),

    /// Validation failed due to an internal service error.
    InternalServiceError(BoxError),

    /// The `Date` or `X-Date` header could not be parsed as an HTTP date.
    InvalidDate(/* message */ String),

    /// The signature header could not be parsed. Sample messages:
    /// `Signature header requires 'keyId' parameter.`
    /// `Signature parameter 'signature' is not valid base64.`
    /// `Unterminated quoted string in signature parameters.`
    MalformedSignature {
        /// Why parsing failed.
        message: String,

        /// The raw header value, for diagnostics.
        header: String,
    },

    /// The request does not carry a signature. This is the challenge case; no credential lookup
    /// is attempted.
    MissingSignature(/* message */ String),

    /// A header named in the signed header list is not present on the request.
    MissingSignedHeader(/* header name */ String),

    /// A header the scheme requires to be signed is not in the signed header list.
    RequiredHeaderNotSigned(/* header name */ String),

    /// Signature did not match the signing string.
    SignatureDoesNotMatch(Option</* message */ String>),

    /// The declared algorithm is unknown or not allowed by this scheme.
    UnsupportedAlgorithm(/* algorithm */ String),
}

impl SignatureError {
    /// The short error code, suitable for machine-readable error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadCredentialShape(_) => ERR_CODE_BAD_CREDENTIAL_SHAPE,
            Self::ExpiredRequest(_) => ERR_CODE_EXPIRED_REQUEST,
            Self::InternalServiceError(_) => ERR_CODE_INTERNAL_FAILURE,
            Self::InvalidDate(_) => ERR_CODE_INVALID_DATE,
            Self::MalformedSignature {
                ..
            } => ERR_CODE_MALFORMED_SIGNATURE,
            Self::MissingSignature(_) => ERR_CODE_MISSING_SIGNATURE,
            Self::MissingSignedHeader(_) => ERR_CODE_MISSING_SIGNED_HEADER,
            Self::RequiredHeaderNotSigned(_) => ERR_CODE_REQUIRED_HEADER_NOT_SIGNED,
            Self::SignatureDoesNotMatch(_) => ERR_CODE_SIGNATURE_DOES_NOT_MATCH,
            Self::UnsupportedAlgorithm(_) => ERR_CODE_UNSUPPORTED_ALGORITHM,
        }
    }

    /// The HTTP status this error maps to when it terminates a request.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidDate(_)
            | Self::MalformedSignature {
                ..
            }
            | Self::UnsupportedAlgorithm(_) => StatusCode::BAD_REQUEST,
            Self::BadCredentialShape(_) | Self::InternalServiceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Indicates whether a `WWW-Authenticate: Signature` challenge accompanies this error.
    pub fn is_challenge(&self) -> bool {
        self.http_status() == StatusCode::UNAUTHORIZED
    }

    /// Create a malformed-signature error for the given raw header value.
    pub(crate) fn malformed<M: Into<String>>(message: M, header: &[u8]) -> Self {
        Self::MalformedSignature {
            message: message.into(),
            header: String::from_utf8_lossy(header).into_owned(),
        }
    }
}

impl ServiceError for SignatureError {
    fn error_code(&self) -> &'static str {
        SignatureError::error_code(self)
    }

    fn http_status(&self) -> StatusCode {
        SignatureError::http_status(self)
    }
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::BadCredentialShape(msg) => f.write_str(msg),
            Self::ExpiredRequest(msg) => f.write_str(msg),
            Self::InternalServiceError(ref e) => Display::fmt(e, f),
            Self::InvalidDate(msg) => f.write_str(msg),
            Self::MalformedSignature {
                message,
                ..
            } => f.write_str(message),
            Self::MissingSignature(msg) => f.write_str(msg),
            Self::MissingSignedHeader(name) => write!(f, "Signed header '{}' is not present in the request.", name),
            Self::RequiredHeaderNotSigned(name) => {
                write!(f, "Header '{}' must be included in the signed headers.", name)
            }
            Self::SignatureDoesNotMatch(msg) => {
                if let Some(msg) = msg {
                    f.write_str(msg)
                } else {
                    Ok(())
                }
            }
            Self::UnsupportedAlgorithm(alg) => write!(f, "Unsupported signature algorithm: '{}'", alg),
        }
    }
}

impl Error for SignatureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InternalServiceError(ref e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<BoxError> for SignatureError {
    fn from(e: BoxError) -> SignatureError {
        match e.downcast::<SignatureError>() {
            Ok(sig_err) => *sig_err,
            Err(e) => SignatureError::InternalServiceError(e),
        }
    }
}

/// Error returned when a [`SignatureScheme`][crate::SignatureScheme] cannot be built because the
/// registration-time configuration is incomplete or invalid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// A required setting was not provided.
    MissingField(&'static str),

    /// A setting was provided but is not usable.
    InvalidValue(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::MissingField(field) => write!(f, "Missing required signature scheme setting: {}", field),
            Self::InvalidValue(msg) => f.write_str(msg),
        }
    }
}

impl Error for ConfigError {}

impl From<UninitializedFieldError> for ConfigError {
    fn from(e: UninitializedFieldError) -> Self {
        Self::MissingField(e.field_name())
    }
}
