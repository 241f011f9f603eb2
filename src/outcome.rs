use {
    crate::{constants::*, SignatureError},
    http::StatusCode,
    std::fmt::{Debug, Formatter, Result as FmtResult},
    tower::BoxError,
};

/// The final decision for a request.
pub enum VerificationOutcome<C> {
    /// The signature verified and the payload, if validated, was accepted.
    Authenticated(C),

    /// The request is rejected with a 401 and a `Signature` challenge.
    Unauthenticated {
        /// Why the request was rejected.
        reason: SignatureError,

        /// The credential the resolver returned, if any, for audit logging.
        credential: Option<C>,
    },

    /// The request is rejected with a non-challenge status, or because a resolver or payload
    /// validator failed.
    Errored {
        /// The error. Errors from the resolver and payload validator are passed through as-is.
        cause: BoxError,

        /// Log tags describing where the failure came from.
        tags: &'static [&'static str],
    },
}

impl<C> VerificationOutcome<C> {
    /// Indicates whether the request authenticated.
    #[inline]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The credential attached to this outcome, if any.
    pub fn credential(&self) -> Option<&C> {
        match self {
            Self::Authenticated(credential) => Some(credential),
            Self::Unauthenticated {
                credential,
                ..
            } => credential.as_ref(),
            Self::Errored {
                ..
            } => None,
        }
    }

    /// Consume the outcome, returning the credential if authenticated.
    pub fn into_credential(self) -> Option<C> {
        match self {
            Self::Authenticated(credential) => Some(credential),
            _ => None,
        }
    }

    /// The HTTP status this outcome maps to.
    ///
    /// Errors that are not a [SignatureError] map to 500.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Authenticated(_) => StatusCode::OK,
            Self::Unauthenticated {
                ..
            } => StatusCode::UNAUTHORIZED,
            Self::Errored {
                cause,
                ..
            } => match cause.downcast_ref::<SignatureError>() {
                Some(e) => e.http_status(),
                None => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// The `WWW-Authenticate` challenge to send with a rejection, if any.
    pub fn challenge(&self) -> Option<&'static str> {
        if self.http_status() == StatusCode::UNAUTHORIZED {
            Some(AUTH_SCHEME_SIGNATURE)
        } else {
            None
        }
    }

    /// A short human-readable reason for a rejection.
    pub fn reason(&self) -> String {
        match self {
            Self::Authenticated(_) => String::new(),
            Self::Unauthenticated {
                reason,
                ..
            } => reason.to_string(),
            Self::Errored {
                cause,
                ..
            } => cause.to_string(),
        }
    }

    /// Fold a payload validation result into an authenticated outcome.
    ///
    /// Rejections pass through unchanged; the payload is only consulted once the signature has
    /// authenticated.
    pub(crate) fn with_payload_result(self, payload: Result<bool, BoxError>) -> Self {
        let credential = match self {
            Self::Authenticated(credential) => credential,
            other => return other,
        };

        match payload {
            Ok(true) => Self::Authenticated(credential),
            Ok(false) => Self::Unauthenticated {
                reason: SignatureError::SignatureDoesNotMatch(Some(MSG_BAD_SIGNATURE.to_string())),
                credential: Some(credential),
            },
            Err(cause) => Self::Errored {
                cause,
                tags: LOG_TAGS_AUTH_SIGNATURE,
            },
        }
    }
}

impl<C: Debug> Debug for VerificationOutcome<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Authenticated(credential) => f.debug_tuple("Authenticated").field(credential).finish(),
            Self::Unauthenticated {
                reason,
                credential,
            } => f.debug_struct("Unauthenticated").field("reason", reason).field("credential", credential).finish(),
            Self::Errored {
                cause,
                tags,
            } => f.debug_struct("Errored").field("cause", cause).field("tags", tags).finish(),
        }
    }
}
