//! The `scratchstack_http_signature` crate verifies HTTP Signatures
//! ([draft-cavage-http-signatures](https://datatracker.ietf.org/doc/html/draft-cavage-http-signatures))
//! on incoming requests. It does not sign outgoing requests.
//!
//! A client signs a canonical string built from selected request headers and sends the signature,
//! its key id, and the algorithm in an `Authorization: Signature ...` or `Signature` header. The
//! server rebuilds the same string, finds the key for the key id, and checks the signature.
//!
//! # Workflow
//! 1. Write a credential resolver: a [tower::Service] (or an async function wrapped with
//!    [service_for_resolver_fn]) that looks up the key for
//!    [`key_id`][ResolveCredentialRequest::key_id], calls
//!    [`SignedRequest::verify`] with it, and returns a verdict and the caller's credential.
//! 2. Optionally write a payload validator (e.g. checking a `Digest` header against the body) and
//!    wrap it with [service_for_payload_fn].
//! 3. Register a [SignatureScheme] with [`SignatureScheme::builder`].
//! 4. Call [`SignatureScheme::authenticate`] or [`SignatureScheme::verify`] per request, or wrap a
//!    service with [SignatureVerifierLayer].
//!
//! ## Example
//! ```rust
//! use base64::{engine::general_purpose::STANDARD, Engine};
//! use chrono::{TimeZone, Utc};
//! use hmac::{Hmac, Mac};
//! use http::Request;
//! use scratchstack_http_signature::{
//!     service_for_resolver_fn, ResolveCredentialRequest, ResolveCredentialResponse, SignatureScheme,
//!     VerificationKey,
//! };
//! use sha2::Sha256;
//! use tower::BoxError;
//!
//! const SECRET: &[u8] = b"correct horse battery staple";
//!
//! // This is a mock resolver with a single key. For actual use, you would call out to a database
//! // or other service to find the key.
//! async fn resolve(req: ResolveCredentialRequest) -> Result<ResolveCredentialResponse<String>, BoxError> {
//!     if req.key_id() != "client-1" {
//!         return Ok(ResolveCredentialResponse::invalid(None));
//!     }
//!
//!     let is_valid = req.signed_request().verify(&VerificationKey::hmac(SECRET));
//!     Ok(ResolveCredentialResponse::new(is_valid, Some("client-1".to_string())))
//! }
//!
//! # tokio_test::block_on(async {
//! let date = "Sun, 05 Jan 2014 21:31:40 GMT";
//! let mut mac = Hmac::<Sha256>::new_from_slice(SECRET).unwrap();
//! mac.update(format!("(request-target): get /resource\nhost: example.com\ndate: {date}").as_bytes());
//! let signature = STANDARD.encode(mac.finalize().into_bytes());
//!
//! // Normally this would come from your web framework.
//! let req = Request::get("/resource")
//!     .header("Host", "example.com")
//!     .header("Date", date)
//!     .header(
//!         "Signature",
//!         format!(
//!             r#"keyId="client-1",algorithm="hmac-sha256",headers="(request-target) host date",signature="{signature}""#
//!         ),
//!     )
//!     .body(())
//!     .unwrap();
//! let (parts, _body) = req.into_parts();
//!
//! let scheme = SignatureScheme::builder().resolver(service_for_resolver_fn(resolve)).build().unwrap();
//! let now = Utc.with_ymd_and_hms(2014, 1, 5, 21, 32, 0).unwrap();
//! let outcome = scheme.authenticate(&parts, now).await;
//! assert_eq!(outcome.into_credential().as_deref(), Some("client-1"));
//! # });
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

mod algorithm;
mod auth;
mod body;
mod chronoutil;
mod constants;
mod crypto;
mod error;
mod outcome;
mod payload;
mod resolver;
mod service;
mod settings;

#[cfg(any(doc, feature = "unstable"))]
pub mod canonical;
#[cfg(not(any(doc, feature = "unstable")))]
mod canonical;

#[cfg(any(doc, feature = "unstable"))]
pub mod header;
#[cfg(not(any(doc, feature = "unstable")))]
mod header;

pub use {
    algorithm::SignatureAlgorithm,
    auth::{SignatureScheme, SignatureSchemeBuilder},
    body::IntoRequestBytes,
    canonical::SignedRequest,
    constants::{LOG_TAGS_AUTH_CREDENTIALS, LOG_TAGS_AUTH_SIGNATURE},
    crypto::VerificationKey,
    error::{ConfigError, SignatureError},
    header::{HeaderSource, ParsedSignature},
    outcome::VerificationOutcome,
    payload::{service_for_payload_fn, NoPayloadValidator, ValidatePayloadRequest},
    resolver::{
        service_for_resolver_fn, ResolveCredentialRequest, ResolveCredentialRequestBuilder, ResolveCredentialResponse,
    },
    service::{Authenticated, ChallengeErrorMapper, ErrorMapper, SignatureVerifierLayer, SignatureVerifierService},
    settings::{Settings, SettingsBuilder, UnsupportedAlgorithmPolicy},
};
