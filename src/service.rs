//! Tower middleware that authenticates requests before handing them to an inner service.
use {
    crate::{
        IntoRequestBytes, ResolveCredentialRequest, ResolveCredentialResponse, SignatureScheme, ValidatePayloadRequest,
        VerificationOutcome,
    },
    async_trait::async_trait,
    bytes::Bytes,
    chrono::Utc,
    http::{
        header::{CONTENT_TYPE, WWW_AUTHENTICATE},
        Request, Response,
    },
    log::debug,
    std::{
        any::type_name,
        fmt::{Debug, Formatter, Result as FmtResult},
        future::Future,
        marker::PhantomData,
        pin::Pin,
        task::{Context, Poll},
    },
    tower::{BoxError, Layer, Service, ServiceExt},
};

/// Request extension carrying the credential of an authenticated request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Authenticated<C>(pub C);

/// Converts a rejected [VerificationOutcome] into a response.
#[async_trait]
pub trait ErrorMapper<C, ResBody>: Clone + Send + Sync + 'static
where
    C: Send + 'static,
{
    /// Produce the response for a request that did not authenticate.
    async fn map_error(self, outcome: VerificationOutcome<C>) -> Result<Response<ResBody>, BoxError>;
}

/// Default [ErrorMapper]: responds with the outcome's status, a `WWW-Authenticate: Signature`
/// challenge on 401, and a plain-text reason.
pub struct ChallengeErrorMapper<ResBody> {
    _body: PhantomData<fn() -> ResBody>,
}

impl<ResBody> ChallengeErrorMapper<ResBody> {
    /// Create a new challenge error mapper.
    pub fn new() -> Self {
        Self {
            _body: PhantomData,
        }
    }
}

impl<ResBody> Default for ChallengeErrorMapper<ResBody> {
    fn default() -> Self {
        Self::new()
    }
}

impl<ResBody> Clone for ChallengeErrorMapper<ResBody> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<ResBody> Debug for ChallengeErrorMapper<ResBody> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str("ChallengeErrorMapper")
    }
}

#[async_trait]
impl<C, ResBody> ErrorMapper<C, ResBody> for ChallengeErrorMapper<ResBody>
where
    C: Send + 'static,
    ResBody: From<String> + Send + 'static,
{
    async fn map_error(self, outcome: VerificationOutcome<C>) -> Result<Response<ResBody>, BoxError> {
        let status = outcome.http_status();
        let message = if status.is_server_error() {
            "An internal server error occurred".to_string()
        } else {
            outcome.reason()
        };

        let mut builder = Response::builder().status(status).header(CONTENT_TYPE, "text/plain; charset=utf-8");
        if let Some(challenge) = outcome.challenge() {
            builder = builder.header(WWW_AUTHENTICATE, challenge);
        }

        builder.body(ResBody::from(message)).map_err(Into::into)
    }
}

/// A service that authenticates requests with a [SignatureScheme] before calling `inner`.
///
/// Authenticated requests reach `inner` with their body collected and an [Authenticated]
/// extension holding the credential. Everything else is handed to the error mapper.
#[derive(Clone)]
pub struct SignatureVerifierService<R, P, S, E> {
    scheme: SignatureScheme<R, P>,
    inner: S,
    error_mapper: E,
}

impl<R, P, S, E> SignatureVerifierService<R, P, S, E> {
    /// Wrap `inner` with signature verification.
    pub fn new(scheme: SignatureScheme<R, P>, inner: S, error_mapper: E) -> Self {
        Self {
            scheme,
            inner,
            error_mapper,
        }
    }

    /// Retrieve the signature scheme.
    #[inline]
    pub fn scheme(&self) -> &SignatureScheme<R, P> {
        &self.scheme
    }
}

impl<R, P, S, E> Debug for SignatureVerifierService<R, P, S, E> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("SignatureVerifierService")
            .field("scheme", &self.scheme)
            .field("inner", &type_name::<S>())
            .field("error_mapper", &type_name::<E>())
            .finish()
    }
}

impl<R, P, S, E, C, ReqBody, ResBody> Service<Request<ReqBody>> for SignatureVerifierService<R, P, S, E>
where
    R: Service<ResolveCredentialRequest, Response = ResolveCredentialResponse<C>, Error = BoxError>
        + Clone
        + Send
        + Sync
        + 'static,
    R::Future: Send,
    P: Service<ValidatePayloadRequest, Response = bool, Error = BoxError> + Clone + Send + Sync + 'static,
    P::Future: Send,
    S: Service<Request<Bytes>, Response = Response<ResBody>, Error = BoxError> + Clone + Send + 'static,
    S::Future: Send,
    E: ErrorMapper<C, ResBody>,
    C: Clone + Send + Sync + 'static,
    ReqBody: IntoRequestBytes + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResBody>, BoxError>> + Send>>;

    fn poll_ready(&mut self, c: &mut Context) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(c)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let scheme = self.scheme.clone();
        let inner = self.inner.clone();
        let error_mapper = self.error_mapper.clone();

        Box::pin(async move {
            let (mut parts, body, outcome) = scheme.verify(req, Utc::now()).await?;

            match outcome {
                VerificationOutcome::Authenticated(credential) => {
                    parts.extensions.insert(Authenticated(credential));
                    inner.oneshot(Request::from_parts(parts, body)).await
                }
                outcome => {
                    debug!("{} {} rejected with status {}", parts.method, parts.uri, outcome.http_status());
                    error_mapper.map_error(outcome).await
                }
            }
        })
    }
}

/// A [Layer] that wraps services in a [SignatureVerifierService].
#[derive(Clone)]
pub struct SignatureVerifierLayer<R, P, E> {
    scheme: SignatureScheme<R, P>,
    error_mapper: E,
}

impl<R, P, E> SignatureVerifierLayer<R, P, E> {
    /// Create a layer from a scheme and an error mapper.
    pub fn new(scheme: SignatureScheme<R, P>, error_mapper: E) -> Self {
        Self {
            scheme,
            error_mapper,
        }
    }
}

impl<R, P, ResBody> SignatureVerifierLayer<R, P, ChallengeErrorMapper<ResBody>> {
    /// Create a layer that rejects with [ChallengeErrorMapper].
    pub fn with_challenge(scheme: SignatureScheme<R, P>) -> Self {
        Self::new(scheme, ChallengeErrorMapper::new())
    }
}

impl<R, P, E> Debug for SignatureVerifierLayer<R, P, E> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("SignatureVerifierLayer")
            .field("scheme", &self.scheme)
            .field("error_mapper", &type_name::<E>())
            .finish()
    }
}

impl<R, P, E, S> Layer<S> for SignatureVerifierLayer<R, P, E>
where
    R: Clone,
    P: Clone,
    E: Clone,
{
    type Service = SignatureVerifierService<R, P, S, E>;

    fn layer(&self, inner: S) -> Self::Service {
        SignatureVerifierService::new(self.scheme.clone(), inner, self.error_mapper.clone())
    }
}
