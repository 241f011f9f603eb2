use {
    bytes::Bytes,
    http::{request::Parts, HeaderMap, Method, Uri},
    std::{
        future::{ready, Future, Ready},
        task::{Context, Poll},
    },
    tower::{service_fn, util::ServiceFn, BoxError, Service},
};

/// A request to validate the body of an authenticated request.
///
/// Payload validators typically compare a signed `Digest` header against the body.
#[derive(Clone, Debug)]
pub struct ValidatePayloadRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl ValidatePayloadRequest {
    /// Create a request from a method, URI, headers, and body.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    pub(crate) fn from_parts(parts: &Parts, body: Bytes) -> Self {
        Self::new(parts.method.clone(), parts.uri.clone(), parts.headers.clone(), body)
    }

    /// Retrieve the request method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Retrieve the request URI.
    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Retrieve the request headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Retrieve the request body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Payload validator used when none is configured. Every payload is accepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPayloadValidator;

impl Service<ValidatePayloadRequest> for NoPayloadValidator {
    type Response = bool;
    type Error = BoxError;
    type Future = Ready<Result<bool, BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), BoxError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: ValidatePayloadRequest) -> Self::Future {
        ready(Ok(true))
    }
}

/// Create a Service that wraps a function that validates payloads.
pub fn service_for_payload_fn<F, Fut>(f: F) -> ServiceFn<F>
where
    F: FnMut(ValidatePayloadRequest) -> Fut + Send + 'static,
    Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
{
    service_fn(f)
}
