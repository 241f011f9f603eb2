//! Signing string reconstruction.
//!
//! **Stability of this module is not guaranteed except for items exposed at the crate root**.
//! The functions and types are subject to change in minor/patch versions. This is exposed for
//! testing purposes only.
use {
    crate::{constants::*, crypto::verify_signature, ParsedSignature, SignatureError, VerificationKey},
    http::{request::Parts, HeaderMap, Method, Uri, Version},
    log::trace,
    qualifier_attr::qualifiers,
    std::fmt::{Debug, Formatter, Result as FmtResult},
};

/// A parsed signature together with the signing string reconstructed from the request.
///
/// This is what the credential resolver receives. The resolver looks up key material for
/// [`key_id`][ParsedSignature::key_id] and calls [`verify`][Self::verify] with it.
#[derive(Clone)]
pub struct SignedRequest {
    parsed: ParsedSignature,
    signing_string: Vec<u8>,
}

impl SignedRequest {
    /// Reconstruct the signing string for `parsed` from the request parts.
    pub fn from_parts(parsed: ParsedSignature, parts: &Parts) -> Result<Self, SignatureError> {
        let signing_string =
            build_signing_string(parsed.headers(), &parts.method, &parts.uri, parts.version, &parts.headers)?;
        trace!("Signing string:\n{}", String::from_utf8_lossy(&signing_string));
        Ok(Self {
            parsed,
            signing_string,
        })
    }

    /// The parsed signature parameters.
    #[inline]
    pub fn parsed(&self) -> &ParsedSignature {
        &self.parsed
    }

    /// The key identifier the client signed with.
    #[inline]
    pub fn key_id(&self) -> &str {
        self.parsed.key_id()
    }

    /// The reconstructed signing string.
    #[inline]
    pub fn signing_string(&self) -> &[u8] {
        &self.signing_string
    }

    /// Verify the signature against `key` using the declared algorithm.
    ///
    /// Returns `false` if the signature does not match, including when `key` is not of the
    /// family the declared algorithm requires.
    pub fn verify(&self, key: &VerificationKey) -> bool {
        verify_signature(self.parsed.algorithm(), key, &self.signing_string, self.parsed.signature())
    }
}

impl Debug for SignedRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SignedRequest")
            .field("parsed", &self.parsed)
            .field("signing_string", &String::from_utf8_lossy(&self.signing_string))
            .finish()
    }
}

/// Build the signing string: one `name: value` line per signed header, in declared order, joined
/// with `\n` and without a trailing newline.
///
/// `(request-target)` expands to the lowercased method and the path with query. `request-line`
/// expands to the full HTTP/1.1 request line with no name prefix.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn build_signing_string(
    signed_headers: &[String],
    method: &Method,
    uri: &Uri,
    version: Version,
    headers: &HeaderMap,
) -> Result<Vec<u8>, SignatureError> {
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_else(|| uri.path());
    let mut result = Vec::with_capacity(256);

    for (i, name) in signed_headers.iter().enumerate() {
        if i > 0 {
            result.push(b'\n');
        }

        let name = name.to_ascii_lowercase();
        match name.as_str() {
            REQUEST_TARGET => {
                result.extend(REQUEST_TARGET.as_bytes());
                result.extend(b": ");
                result.extend(method.as_str().to_ascii_lowercase().as_bytes());
                result.push(b' ');
                result.extend(path.as_bytes());
            }
            REQUEST_LINE => {
                result.extend(method.as_str().as_bytes());
                result.push(b' ');
                result.extend(path.as_bytes());
                result.push(b' ');
                result.extend(format!("{:?}", version).as_bytes());
            }
            _ => {
                result.extend(name.as_bytes());
                result.extend(b": ");
                result.extend(header_value(&name, uri, headers)?);
            }
        }
    }

    Ok(result)
}

/// Get the value of a signed header. Repeated headers are joined with `", "`.
fn header_value(name: &str, uri: &Uri, headers: &HeaderMap) -> Result<Vec<u8>, SignatureError> {
    let mut values = headers.get_all(name).iter().peekable();

    if values.peek().is_none() {
        // HTTP/2 requests carry the host in the :authority pseudo-header instead.
        if name == HOST {
            if let Some(authority) = uri.authority() {
                return Ok(authority.as_str().as_bytes().to_vec());
            }
        }

        trace!("Signed header '{}' is missing from the request", name);
        return Err(SignatureError::MissingSignedHeader(name.to_string()));
    }

    let mut result = Vec::new();
    for (i, value) in values.enumerate() {
        if i > 0 {
            result.extend(b", ");
        }
        result.extend(value.as_bytes());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use {
        super::build_signing_string,
        crate::{ParsedSignature, SignatureError, SignedRequest},
        http::{HeaderMap, HeaderValue, Method, Request, Uri, Version},
    };

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("example.com"));
        headers.insert("date", HeaderValue::from_static("Sun, 05 Jan 2014 21:31:40 GMT"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.append("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.append("x-forwarded-for", HeaderValue::from_static("10.0.0.2"));
        headers
    }

    #[test_log::test]
    fn request_target_and_headers() {
        let uri = Uri::from_static("/foo?param=value&pet=dog");
        let result = build_signing_string(
            &names(&["(request-target)", "host", "date"]),
            &Method::POST,
            &uri,
            Version::HTTP_11,
            &headers(),
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(result).unwrap(),
            "(request-target): post /foo?param=value&pet=dog\nhost: example.com\ndate: Sun, 05 Jan 2014 21:31:40 GMT"
        );
    }

    #[test_log::test]
    fn request_line() {
        let uri = Uri::from_static("/foo?a=b");
        let result =
            build_signing_string(&names(&["request-line", "date"]), &Method::GET, &uri, Version::HTTP_11, &headers())
                .unwrap();
        assert_eq!(String::from_utf8(result).unwrap(), "GET /foo?a=b HTTP/1.1\ndate: Sun, 05 Jan 2014 21:31:40 GMT");
    }

    #[test_log::test]
    fn repeated_and_mixed_case() {
        let uri = Uri::from_static("/");
        let result = build_signing_string(
            &names(&["X-Forwarded-For", "Content-Type"]),
            &Method::GET,
            &uri,
            Version::HTTP_11,
            &headers(),
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(result).unwrap(),
            "x-forwarded-for: 10.0.0.1, 10.0.0.2\ncontent-type: application/json"
        );
    }

    #[test_log::test]
    fn missing_header() {
        let uri = Uri::from_static("/");
        let e = build_signing_string(&names(&["date", "digest"]), &Method::GET, &uri, Version::HTTP_11, &headers())
            .unwrap_err();
        if let SignatureError::MissingSignedHeader(ref name) = e {
            assert_eq!(name, "digest");
            assert_eq!(e.http_status(), 401);
        } else {
            panic!("Unexpected error: {:?}", e);
        }
    }

    #[test_log::test]
    fn host_from_authority() {
        let uri = Uri::from_static("https://api.example.com:8443/resource");
        let result = build_signing_string(
            &names(&["host", "(request-target)"]),
            &Method::GET,
            &uri,
            Version::HTTP_2,
            &HeaderMap::new(),
        )
        .unwrap();
        assert_eq!(String::from_utf8(result).unwrap(), "host: api.example.com:8443\n(request-target): get /resource");

        let uri = Uri::from_static("/");
        let e = build_signing_string(&names(&["host"]), &Method::GET, &uri, Version::HTTP_11, &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(e, SignatureError::MissingSignedHeader(_)));
    }

    #[test_log::test]
    fn deterministic() {
        let parsed = ParsedSignature::parse(
            br#"keyId="k1",algorithm="hmac-sha256",headers="(request-target) host date content-type",signature="c2ln""#,
        )
        .unwrap();
        let mut builder = Request::builder().method("PUT").uri("/a/b?c=d");
        for (name, value) in headers().iter() {
            builder = builder.header(name.clone(), value.clone());
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();

        let first = SignedRequest::from_parts(parsed.clone(), &parts).unwrap();
        for _ in 0..10 {
            let again = SignedRequest::from_parts(parsed.clone(), &parts).unwrap();
            assert_eq!(first.signing_string(), again.signing_string());
        }
        assert_eq!(first.key_id(), "k1");
        assert_eq!(first.parsed(), &parsed);
        let _ = format!("{:?}", first);
    }
}
