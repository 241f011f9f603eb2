//! Signature scheme registration and the per-request authentication decision.
use {
    crate::{
        constants::*, ConfigError, IntoRequestBytes, NoPayloadValidator, ParsedSignature, ResolveCredentialRequest,
        ResolveCredentialResponse, Settings, SignatureError, SignedRequest, UnsupportedAlgorithmPolicy,
        ValidatePayloadRequest, VerificationOutcome,
    },
    bytes::Bytes,
    chrono::{DateTime, Utc},
    http::{request::Parts, Request},
    log::{debug, trace, warn},
    std::{
        any::type_name,
        fmt::{Debug, Formatter, Result as FmtResult},
        sync::Arc,
    },
    tower::{BoxError, Service, ServiceExt},
};

/// A registered HTTP Signature authentication scheme.
///
/// The credential resolver `R` and payload validator `P` are [tower::Service]s. Each request
/// clones them and drives the clone with [oneshot][ServiceExt::oneshot], so every request calls
/// each of them at most once.
#[derive(Clone)]
pub struct SignatureScheme<R, P = NoPayloadValidator> {
    resolver: R,
    payload_validator: Option<P>,
    settings: Arc<Settings>,
}

impl SignatureScheme<(), NoPayloadValidator> {
    /// Create a [SignatureSchemeBuilder] to register a scheme.
    #[inline]
    pub fn builder() -> SignatureSchemeBuilder<(), NoPayloadValidator> {
        SignatureSchemeBuilder::default()
    }
}

impl<R, P> SignatureScheme<R, P> {
    /// Retrieve the scheme settings.
    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Indicates whether a payload validator is configured.
    #[inline]
    pub fn has_payload_validator(&self) -> bool {
        self.payload_validator.is_some()
    }
}

impl<R, P> Debug for SignatureScheme<R, P> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("SignatureScheme")
            .field("resolver", &type_name::<R>())
            .field("payload_validator", &self.payload_validator.as_ref().map(|_| type_name::<P>()))
            .field("settings", &self.settings)
            .finish()
    }
}

impl<R, P, C> SignatureScheme<R, P>
where
    R: Service<ResolveCredentialRequest, Response = ResolveCredentialResponse<C>, Error = BoxError>
        + Clone
        + Send
        + 'static,
    R::Future: Send,
{
    /// Decide whether a request's signature authenticates it.
    ///
    /// Nothing is consulted beyond the request parts and `server_timestamp` until the signature
    /// parses, satisfies the scheme settings, and its signing string can be rebuilt. Only then is
    /// the credential resolver called.
    pub async fn authenticate(&self, parts: &Parts, server_timestamp: DateTime<Utc>) -> VerificationOutcome<C> {
        let signed_request = match self.prepare(parts, server_timestamp) {
            Ok(signed_request) => signed_request,
            Err(e) => return self.rejection(e),
        };

        debug!("authenticate: resolving credential for keyId {}", signed_request.key_id());
        let request = ResolveCredentialRequest::from_parts(parts, signed_request);
        let response = match self.resolver.clone().oneshot(request).await {
            Ok(response) => response,
            Err(cause) => {
                warn!("{:?} Credential resolver failed: {}", LOG_TAGS_AUTH_SIGNATURE, cause);
                return VerificationOutcome::Errored {
                    cause,
                    tags: LOG_TAGS_AUTH_SIGNATURE,
                };
            }
        };

        match response {
            ResolveCredentialResponse {
                is_valid: false,
                credential,
            } => {
                trace!("authenticate: resolver rejected the signature");
                VerificationOutcome::Unauthenticated {
                    reason: SignatureError::SignatureDoesNotMatch(Some(MSG_BAD_SIGNATURE.to_string())),
                    credential,
                }
            }
            ResolveCredentialResponse {
                is_valid: true,
                credential: None,
            } => {
                warn!("{:?} {}", LOG_TAGS_AUTH_CREDENTIALS, MSG_BAD_CREDENTIALS_OBJECT);
                VerificationOutcome::Errored {
                    cause: Box::new(SignatureError::BadCredentialShape(MSG_BAD_CREDENTIALS_OBJECT.to_string())),
                    tags: LOG_TAGS_AUTH_CREDENTIALS,
                }
            }
            ResolveCredentialResponse {
                is_valid: true,
                credential: Some(credential),
            } => VerificationOutcome::Authenticated(credential),
        }
    }

    /// Parse the signature, apply the scheme settings, and rebuild the signing string.
    fn prepare(&self, parts: &Parts, server_timestamp: DateTime<Utc>) -> Result<SignedRequest, SignatureError> {
        let parsed = ParsedSignature::from_headers(&parts.headers, self.settings.header_source())?;
        trace!("prepare: parsed signature {:?}", parsed);
        self.settings.check_policy(&parsed)?;
        let signed_request = SignedRequest::from_parts(parsed, parts)?;
        self.settings.check_clock_skew(signed_request.parsed(), &parts.headers, server_timestamp)?;
        Ok(signed_request)
    }

    /// Turn a failure found before the resolver runs into an outcome.
    fn rejection(&self, e: SignatureError) -> VerificationOutcome<C> {
        debug!("authenticate: rejecting request: {}", e);

        let challenge = match e {
            SignatureError::UnsupportedAlgorithm(_) => {
                self.settings.unsupported_algorithm_policy() == UnsupportedAlgorithmPolicy::Unauthorized
            }
            _ => e.is_challenge(),
        };

        if challenge {
            VerificationOutcome::Unauthenticated {
                reason: e,
                credential: None,
            }
        } else {
            VerificationOutcome::Errored {
                cause: Box::new(e),
                tags: LOG_TAGS_AUTH_SIGNATURE,
            }
        }
    }
}

impl<R, P> SignatureScheme<R, P>
where
    P: Service<ValidatePayloadRequest, Response = bool, Error = BoxError> + Clone + Send + 'static,
    P::Future: Send,
{
    /// Validate the body of an authenticated request. Passes if no payload validator is configured.
    pub async fn validate_payload(&self, parts: &Parts, body: Bytes) -> Result<bool, BoxError> {
        let Some(payload_validator) = &self.payload_validator else {
            return Ok(true);
        };

        let request = ValidatePayloadRequest::from_parts(parts, body);
        match payload_validator.clone().oneshot(request).await {
            Ok(is_valid) => {
                trace!("validate_payload: is_valid={}", is_valid);
                Ok(is_valid)
            }
            Err(e) => {
                warn!("{:?} Payload validator failed: {}", LOG_TAGS_AUTH_SIGNATURE, e);
                Err(e)
            }
        }
    }
}

impl<R, P, C> SignatureScheme<R, P>
where
    R: Service<ResolveCredentialRequest, Response = ResolveCredentialResponse<C>, Error = BoxError>
        + Clone
        + Send
        + 'static,
    R::Future: Send,
    P: Service<ValidatePayloadRequest, Response = bool, Error = BoxError> + Clone + Send + 'static,
    P::Future: Send,
{
    /// Authenticate a request and, if it authenticates, validate its payload.
    ///
    /// The body is read into memory so it can be validated and handed on. The returned parts and
    /// body can be reassembled into the request.
    pub async fn verify<B>(
        &self,
        request: Request<B>,
        server_timestamp: DateTime<Utc>,
    ) -> Result<(Parts, Bytes, VerificationOutcome<C>), BoxError>
    where
        B: IntoRequestBytes,
    {
        let (parts, body) = request.into_parts();
        let body = body.into_request_bytes().await?;

        let outcome = self.authenticate(&parts, server_timestamp).await;
        let outcome = if outcome.is_authenticated() && self.has_payload_validator() {
            outcome.with_payload_result(self.validate_payload(&parts, body.clone()).await)
        } else {
            outcome
        };

        Ok((parts, body, outcome))
    }
}

/// Builder for a [SignatureScheme].
///
/// The resolver is required; [build][Self::build] fails with [ConfigError::MissingField] without
/// one.
pub struct SignatureSchemeBuilder<R, P> {
    resolver: Option<R>,
    payload_validator: Option<P>,
    settings: Settings,
}

impl Default for SignatureSchemeBuilder<(), NoPayloadValidator> {
    fn default() -> Self {
        Self {
            resolver: None,
            payload_validator: None,
            settings: Settings::default(),
        }
    }
}

impl<R, P> SignatureSchemeBuilder<R, P> {
    /// Set the credential resolver.
    pub fn resolver<R2>(self, resolver: R2) -> SignatureSchemeBuilder<R2, P> {
        SignatureSchemeBuilder {
            resolver: Some(resolver),
            payload_validator: self.payload_validator,
            settings: self.settings,
        }
    }

    /// Set the payload validator.
    pub fn payload_validator<P2>(self, payload_validator: P2) -> SignatureSchemeBuilder<R, P2> {
        SignatureSchemeBuilder {
            resolver: self.resolver,
            payload_validator: Some(payload_validator),
            settings: self.settings,
        }
    }

    /// Set the scheme settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the scheme.
    pub fn build(self) -> Result<SignatureScheme<R, P>, ConfigError> {
        let Some(resolver) = self.resolver else {
            return Err(ConfigError::MissingField("resolver"));
        };

        Ok(SignatureScheme {
            resolver,
            payload_validator: self.payload_validator,
            settings: Arc::new(self.settings),
        })
    }
}

impl<R, P> Debug for SignatureSchemeBuilder<R, P> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("SignatureSchemeBuilder")
            .field("resolver", &self.resolver.as_ref().map(|_| type_name::<R>()))
            .field("payload_validator", &self.payload_validator.as_ref().map(|_| type_name::<P>()))
            .field("settings", &self.settings)
            .finish()
    }
}
