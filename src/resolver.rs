use {
    crate::SignedRequest,
    derive_builder::Builder,
    http::{request::Parts, HeaderMap, Method, Uri},
    std::future::Future,
    tower::{service_fn, util::ServiceFn, BoxError},
};

/// A request to resolve the credential for a signed request.
///
/// The resolver looks up key material for [`key_id`][Self::key_id], checks the signature with
/// [`SignedRequest::verify`], and returns the verdict along with the caller's identity record.
#[derive(Builder, Clone, Debug)]
pub struct ResolveCredentialRequest {
    /// The request method.
    #[builder(setter(into))]
    pub(crate) method: Method,

    /// The request URI.
    #[builder(setter(into))]
    pub(crate) uri: Uri,

    /// The request headers.
    #[builder(default)]
    pub(crate) headers: HeaderMap,

    /// The parsed signature and its reconstructed signing string.
    pub(crate) signed_request: SignedRequest,
}

impl ResolveCredentialRequest {
    /// Create a [ResolveCredentialRequestBuilder] to construct a [ResolveCredentialRequest].
    #[inline]
    pub fn builder() -> ResolveCredentialRequestBuilder {
        ResolveCredentialRequestBuilder::default()
    }

    /// Create a request from HTTP request parts and the signature found in them.
    pub(crate) fn from_parts(parts: &Parts, signed_request: SignedRequest) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            signed_request,
        }
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

    /// Retrieve the key identifier the client signed with.
    #[inline]
    pub fn key_id(&self) -> &str {
        self.signed_request.key_id()
    }

    /// Retrieve the signed request to verify.
    #[inline]
    pub fn signed_request(&self) -> &SignedRequest {
        &self.signed_request
    }
}

/// A response from the credential resolver.
///
/// A resolver may return a credential even when the signature is invalid; it is attached to the
/// unauthenticated outcome for audit logging.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolveCredentialResponse<C> {
    pub(crate) is_valid: bool,
    pub(crate) credential: Option<C>,
}

impl<C> ResolveCredentialResponse<C> {
    /// Create a response with an explicit verdict.
    pub fn new(is_valid: bool, credential: Option<C>) -> Self {
        Self {
            is_valid,
            credential,
        }
    }

    /// The signature verified and `credential` identifies the caller.
    pub fn valid(credential: C) -> Self {
        Self::new(true, Some(credential))
    }

    /// The signature did not verify, or the key id is unknown.
    pub fn invalid(credential: Option<C>) -> Self {
        Self::new(false, credential)
    }

    /// Retrieve the verdict.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Retrieve the credential, if any.
    #[inline]
    pub fn credential(&self) -> Option<&C> {
        self.credential.as_ref()
    }
}

/// Create a Service that wraps a function that resolves credentials.
pub fn service_for_resolver_fn<F, Fut, C>(f: F) -> ServiceFn<F>
where
    F: FnMut(ResolveCredentialRequest) -> Fut + Send + 'static,
    Fut: Future<Output = Result<ResolveCredentialResponse<C>, BoxError>> + Send + 'static,
{
    service_fn(f)
}

#[cfg(test)]
mod tests {
    use {
        crate::{
            service_for_resolver_fn, ParsedSignature, ResolveCredentialRequest, ResolveCredentialResponse,
            SignedRequest, VerificationKey,
        },
        http::{Method, Request},
        std::sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        tower::{BoxError, Service, ServiceExt},
    };

    fn signed_request() -> (http::request::Parts, SignedRequest) {
        let (parts, _) = Request::get("/resource")
            .header("date", "Sun, 05 Jan 2014 21:31:40 GMT")
            .body(())
            .unwrap()
            .into_parts();
        let parsed = ParsedSignature::parse(br#"keyId="k1",algorithm="hmac-sha256",signature="c2ln""#).unwrap();
        let signed = SignedRequest::from_parts(parsed, &parts).unwrap();
        (parts, signed)
    }

    #[test_log::test]
    fn test_request_derived() {
        let (parts, signed) = signed_request();
        let req = ResolveCredentialRequest::from_parts(&parts, signed.clone());
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), "/resource");
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.key_id(), "k1");
        assert_eq!(req.signed_request().signing_string(), b"date: Sun, 05 Jan 2014 21:31:40 GMT");
        let _ = format!("{:?}", req);

        let built = ResolveCredentialRequest::builder()
            .method(Method::GET)
            .uri(parts.uri.clone())
            .signed_request(signed)
            .build()
            .unwrap();
        assert!(built.headers().is_empty());
        assert_eq!(built.key_id(), req.key_id());

        assert!(ResolveCredentialRequest::builder().method(Method::GET).build().is_err());
    }

    #[test_log::test]
    fn test_response() {
        let valid = ResolveCredentialResponse::valid("alice");
        assert!(valid.is_valid());
        assert_eq!(valid.credential(), Some(&"alice"));

        let invalid = ResolveCredentialResponse::<&str>::invalid(None);
        assert!(!invalid.is_valid());
        assert!(invalid.credential().is_none());
        assert_eq!(invalid, ResolveCredentialResponse::new(false, None));
    }

    async fn resolve(req: ResolveCredentialRequest) -> Result<ResolveCredentialResponse<String>, BoxError> {
        let key = match req.key_id() {
            "k1" => VerificationKey::hmac(b"secret".to_vec()),
            _ => return Ok(ResolveCredentialResponse::invalid(None)),
        };
        Ok(ResolveCredentialResponse::new(req.signed_request().verify(&key), Some("alice".to_string())))
    }

    #[tokio::test]
    async fn test_service_for_resolver_fn() {
        let (parts, signed) = signed_request();
        let svc = service_for_resolver_fn(resolve);
        let response = svc.oneshot(ResolveCredentialRequest::from_parts(&parts, signed)).await.unwrap();

        // "c2ln" is not a valid MAC for this key.
        assert!(!response.is_valid());
        assert_eq!(response.credential().map(String::as_str), Some("alice"));
    }

    #[tokio::test]
    async fn test_service_for_resolver_closure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut svc = service_for_resolver_fn(move |req: ResolveCredentialRequest| {
            counter.fetch_add(1, Ordering::SeqCst);
            let credential = req.key_id().to_string();
            async move { Ok::<_, BoxError>(ResolveCredentialResponse::valid(credential)) }
        });

        for _ in 0..2 {
            let (parts, signed) = signed_request();
            let request = ResolveCredentialRequest::from_parts(&parts, signed);
            let response = svc.ready().await.unwrap().call(request).await.unwrap();
            assert_eq!(response.credential().map(String::as_str), Some("k1"));
        }

        let (parts, signed) = signed_request();
        let response = svc.clone().oneshot(ResolveCredentialRequest::from_parts(&parts, signed)).await.unwrap();
        assert!(response.is_valid());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
