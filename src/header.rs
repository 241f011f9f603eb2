//! Signature header parsing.
//!
//! Two header forms are accepted and produce identical results:
//!
//! ```text
//! Authorization: Signature keyId="k1",algorithm="hmac-sha256",headers="(request-target) host date",signature="..."
//! Signature: keyId="k1",algorithm="hmac-sha256",headers="(request-target) host date",signature="..."
//! ```
use {
    crate::{constants::*, SignatureAlgorithm, SignatureError},
    base64::{engine::general_purpose::STANDARD as BASE64, Engine},
    http::header::{HeaderMap, AUTHORIZATION},
    lazy_static::lazy_static,
    log::trace,
    qualifier_attr::qualifiers,
    regex::Regex,
    std::{
        collections::HashMap,
        fmt::{Debug, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

lazy_static! {
    /// A signed header name: an RFC 7230 token (lowercased) or a parenthesized pseudo-header.
    static ref SIGNED_HEADER_NAME: Regex = Regex::new(r"^(?:\([a-z0-9-]+\)|[a-z0-9!#$%&'*+.^_`|~-]+)$").unwrap();
}

/// Which request header(s) may carry the signature.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum HeaderSource {
    /// `Authorization: Signature ...`, falling back to a bare `Signature` header.
    #[default]
    Either,

    /// Only `Authorization: Signature ...`.
    Authorization,

    /// Only a bare `Signature: ...` header.
    Signature,
}

/// The parameters of a signature header.
///
/// ParsedSignature structs are immutable; every field is validated on construction: the key id,
/// signed header list and signature bytes are never empty.
#[derive(Clone, Eq, PartialEq)]
pub struct ParsedSignature {
    key_id: String,
    algorithm: SignatureAlgorithm,
    headers: Vec<String>,
    signature: Vec<u8>,
    raw: String,
}

impl ParsedSignature {
    /// Parse the parameter list of a signature header (everything after the `Signature` scheme
    /// token for the `Authorization` form, or the whole value of a `Signature` header).
    pub fn parse(params: &[u8]) -> Result<Self, SignatureError> {
        let text = std::str::from_utf8(params)
            .map_err(|_| SignatureError::malformed("Signature header is not valid UTF-8.", params))?;
        let map = split_parameters(text).map_err(|msg| SignatureError::malformed(msg, params))?;

        let mut missing = Vec::new();
        for required in [PARAM_KEY_ID, PARAM_ALGORITHM, PARAM_SIGNATURE] {
            if map.get(required).map(|v| v.is_empty()).unwrap_or(true) {
                missing.push(format!("Signature header requires '{}' parameter.", required));
            }
        }

        if !missing.is_empty() {
            return Err(SignatureError::malformed(missing.join(" "), params));
        }

        let key_id = map[PARAM_KEY_ID].to_string();
        let algorithm = SignatureAlgorithm::from_str(&map[PARAM_ALGORITHM])?;

        let signature = BASE64.decode(&map[PARAM_SIGNATURE]).map_err(|e| {
            trace!("signature parameter failed to decode: {}", e);
            SignatureError::malformed("Signature parameter 'signature' is not valid base64.", params)
        })?;

        if signature.is_empty() {
            return Err(SignatureError::malformed("Signature parameter 'signature' is empty.", params));
        }

        let headers = match map.get(PARAM_HEADERS) {
            None => vec![DEFAULT_SIGNED_HEADER.to_string()],
            Some(list) => parse_header_list(list).map_err(|msg| SignatureError::malformed(msg, params))?,
        };

        Ok(Self {
            key_id,
            algorithm,
            headers,
            signature,
            raw: text.to_string(),
        })
    }

    /// Locate the signature header in a request header map and parse it.
    ///
    /// Returns [`SignatureError::MissingSignature`] when no header of an accepted form is present.
    /// An `Authorization` header with another scheme (e.g. `Basic`) or without parameters is
    /// malformed.
    pub fn from_headers(headers: &HeaderMap, source: HeaderSource) -> Result<Self, SignatureError> {
        Self::parse(find_signature_parameters(headers, source)?)
    }

    /// The key identifier.
    #[inline]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The declared algorithm.
    #[inline]
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// The signed header names, lowercased, in declared order.
    #[inline]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The decoded signature bytes.
    #[inline]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The raw parameter list this was parsed from.
    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Debug for ParsedSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ParsedSignature")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("headers", &self.headers)
            .field("signature", &hex::encode(&self.signature))
            .finish()
    }
}

/// Find the signature parameters in the request headers.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn find_signature_parameters(headers: &HeaderMap, source: HeaderSource) -> Result<&[u8], SignatureError> {
    if source != HeaderSource::Signature {
        if let Some(value) = headers.get(AUTHORIZATION) {
            return authorization_parameters(value.as_bytes());
        }
    }

    if source != HeaderSource::Authorization {
        if let Some(value) = headers.get(HDR_SIGNATURE) {
            return Ok(value.as_bytes().trim_ascii());
        }
    }

    Err(SignatureError::MissingSignature(MSG_MISSING_SIGNATURE.to_string()))
}

/// Strip the `Signature` scheme token from an `Authorization` header value.
fn authorization_parameters(value: &[u8]) -> Result<&[u8], SignatureError> {
    let trimmed = value.trim_ascii();
    let scheme_len = AUTH_SCHEME_SIGNATURE.len();
    let (scheme, rest) = trimmed.split_at(trimmed.len().min(scheme_len));

    if !scheme.eq_ignore_ascii_case(AUTH_SCHEME_SIGNATURE.as_bytes())
        || rest.first().is_some_and(|c| !c.is_ascii_whitespace())
    {
        trace!("authorization header does not use the Signature scheme");
        return Err(SignatureError::malformed("Authorization header does not use the Signature scheme.", value));
    }

    let params = rest.trim_ascii();
    if params.is_empty() {
        return Err(SignatureError::malformed("Authorization header has no signature parameters.", value));
    }

    Ok(params)
}

/// Split a comma-separated `name="value"` list. Quoted values may contain commas and
/// backslash-escaped characters; unquoted values run to the next comma or whitespace.
fn split_parameters(text: &str) -> Result<HashMap<&str, String>, String> {
    let bytes = text.as_bytes();
    let mut result = HashMap::new();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        if pos == bytes.len() {
            break;
        }

        let name_start = pos;
        while pos < bytes.len() && bytes[pos] != b'=' && bytes[pos] != b',' && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name = &text[name_start..pos];
        if name.is_empty() {
            return Err(format!("Empty parameter name at offset {} in signature header.", name_start));
        }

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        if pos == bytes.len() || bytes[pos] != b'=' {
            return Err(format!("'{}' not a valid name=value pair (missing equal-sign) in signature header.", name));
        }
        pos += 1;

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let mut value = Vec::new();
        if pos < bytes.len() && bytes[pos] == b'"' {
            pos += 1;
            let mut terminated = false;
            while pos < bytes.len() {
                match bytes[pos] {
                    b'"' => {
                        terminated = true;
                        pos += 1;
                        break;
                    }
                    b'\\' if pos + 1 < bytes.len() => {
                        value.push(bytes[pos + 1]);
                        pos += 2;
                    }
                    c => {
                        value.push(c);
                        pos += 1;
                    }
                }
            }

            if !terminated {
                return Err("Unterminated quoted string in signature parameters.".to_string());
            }
        } else {
            let value_start = pos;
            while pos < bytes.len() && bytes[pos] != b',' && !bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            value.extend_from_slice(&bytes[value_start..pos]);
        }

        // Only ASCII quotes and backslashes were removed, so this remains valid UTF-8.
        let value = String::from_utf8_lossy(&value).into_owned();
        if result.insert(name, value).is_some() {
            return Err(format!("Duplicate '{}' parameter in signature header.", name));
        }

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        if pos == bytes.len() {
            break;
        }

        if bytes[pos] != b',' {
            return Err(format!("Expected ',' after '{}' parameter in signature header.", name));
        }
        pos += 1;
    }

    Ok(result)
}

/// Parse the whitespace-separated `headers` parameter.
fn parse_header_list(list: &str) -> Result<Vec<String>, String> {
    let headers: Vec<String> = list.split_ascii_whitespace().map(|name| name.to_ascii_lowercase()).collect();

    if headers.is_empty() {
        return Err("Signature parameter 'headers' is empty.".to_string());
    }

    for name in &headers {
        if !SIGNED_HEADER_NAME.is_match(name) {
            return Err(format!("Signature parameter 'headers' contains an invalid header name: '{}'", name));
        }
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use {
        super::{find_signature_parameters, split_parameters},
        crate::{HeaderSource, ParsedSignature, SignatureAlgorithm, SignatureError},
        http::header::{HeaderMap, HeaderValue, AUTHORIZATION},
    };

    const PARAMS: &str =
        r#"keyId="k1",algorithm="hmac-sha256",headers="(request-target) host date",signature="c2lnbmF0dXJl""#;

    fn expect_malformed(params: &str, expected: &str) {
        match ParsedSignature::parse(params.as_bytes()) {
            Err(
                ref e @ SignatureError::MalformedSignature {
                    ref message,
                    ref header,
                },
            ) => {
                assert_eq!(message, expected);
                assert_eq!(header, params);
                assert_eq!(e.http_status(), 400);
            }
            other => panic!("Expected MalformedSignature for {:?}; got {:?}", params, other),
        }
    }

    #[test_log::test]
    fn parse_valid() {
        let sig = ParsedSignature::parse(PARAMS.as_bytes()).unwrap();
        assert_eq!(sig.key_id(), "k1");
        assert_eq!(sig.algorithm(), SignatureAlgorithm::HmacSha256);
        assert_eq!(sig.headers(), &["(request-target)", "host", "date"]);
        assert_eq!(sig.signature(), b"signature");
        assert_eq!(sig.raw(), PARAMS);
        assert_eq!(sig, sig.clone());
        let debug = format!("{:?}", sig);
        assert!(debug.contains("7369676e6174757265"), "{}", debug);
    }

    #[test_log::test]
    fn parse_tolerates_spacing_and_order() {
        let sig = ParsedSignature::parse(
            br#" signature = "c2lnbmF0dXJl" ,  headers="Date  X-Request-ID", keyId="a,b\"c" , algorithm="RSA-SHA256", ext=1 "#,
        )
        .unwrap();
        assert_eq!(sig.key_id(), "a,b\"c");
        assert_eq!(sig.algorithm(), SignatureAlgorithm::RsaSha256);
        assert_eq!(sig.headers(), &["date", "x-request-id"]);
    }

    #[test_log::test]
    fn parse_default_headers() {
        let sig = ParsedSignature::parse(br#"keyId="k1",algorithm="hmac-sha1",signature="c2ln""#).unwrap();
        assert_eq!(sig.headers(), &["date"]);
    }

    #[test_log::test]
    fn parse_missing_parameters() {
        expect_malformed(
            r#"algorithm="hmac-sha256",signature="c2ln""#,
            "Signature header requires 'keyId' parameter.",
        );
        expect_malformed(r#"keyId="k1",algorithm="hmac-sha256""#, "Signature header requires 'signature' parameter.");
        expect_malformed(
            r#"keyId="",signature="c2ln""#,
            "Signature header requires 'keyId' parameter. Signature header requires 'algorithm' parameter.",
        );
    }

    #[test_log::test]
    fn parse_bad_values() {
        expect_malformed(
            r#"keyId="k1",algorithm="hmac-sha256",signature="!!not base64!!""#,
            "Signature parameter 'signature' is not valid base64.",
        );
        expect_malformed(
            r#"keyId="k1",algorithm="hmac-sha256",headers="  ",signature="c2ln""#,
            "Signature parameter 'headers' is empty.",
        );
        expect_malformed(
            r#"keyId="k1",algorithm="hmac-sha256",headers="date ho:st",signature="c2ln""#,
            "Signature parameter 'headers' contains an invalid header name: 'ho:st'",
        );
    }

    #[test_log::test]
    fn parse_bad_syntax() {
        expect_malformed(r#"keyId="k1"#, "Unterminated quoted string in signature parameters.");
        expect_malformed(
            r#"keyId="k1",algorithm"#,
            "'algorithm' not a valid name=value pair (missing equal-sign) in signature header.",
        );
        expect_malformed(r#"keyId="k1" algorithm="x""#, "Expected ',' after 'keyId' parameter in signature header.");
        expect_malformed(r#"keyId="k1",keyId="k2""#, "Duplicate 'keyId' parameter in signature header.");
        expect_malformed(r#"keyId="k1",,"#, "Empty parameter name at offset 11 in signature header.");
    }

    #[test_log::test]
    fn parse_unknown_algorithm() {
        match ParsedSignature::parse(br#"keyId="k1",algorithm="hmac-md5",signature="c2ln""#) {
            Err(SignatureError::UnsupportedAlgorithm(alg)) => assert_eq!(alg, "hmac-md5"),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test_log::test]
    fn header_forms_are_equivalent() {
        let mut auth = HeaderMap::new();
        auth.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Signature {}", PARAMS)).unwrap());
        let mut bare = HeaderMap::new();
        bare.insert("signature", HeaderValue::from_static(PARAMS));

        let from_auth = ParsedSignature::from_headers(&auth, HeaderSource::Either).unwrap();
        let from_bare = ParsedSignature::from_headers(&bare, HeaderSource::Either).unwrap();
        assert_eq!(from_auth, from_bare);

        assert!(ParsedSignature::from_headers(&auth, HeaderSource::Authorization).is_ok());
        assert!(ParsedSignature::from_headers(&bare, HeaderSource::Signature).is_ok());

        match ParsedSignature::from_headers(&bare, HeaderSource::Authorization) {
            Err(SignatureError::MissingSignature(_)) => (),
            other => panic!("Unexpected result: {:?}", other),
        }
        match ParsedSignature::from_headers(&auth, HeaderSource::Signature) {
            Err(SignatureError::MissingSignature(_)) => (),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test_log::test]
    fn authorization_requires_signature_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("signature keyId=\"x\""));
        assert_eq!(find_signature_parameters(&headers, HeaderSource::Either).unwrap(), &b"keyId=\"x\""[..]);

        for value in ["Basic dXNlcjpwYXNz", "Signatures keyId=\"x\"", "Signature", "Signature   ", "Sig"] {
            headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
            match ParsedSignature::from_headers(&headers, HeaderSource::Either) {
                Err(ref e @ SignatureError::MalformedSignature {
                    ref header,
                    ..
                }) => {
                    assert_eq!(header, value);
                    assert_eq!(e.http_status(), 400);
                }
                other => panic!("Expected MalformedSignature for {:?}; got {:?}", value, other),
            }
        }

        // A bare Signature header is only consulted when no Authorization header is present.
        headers.insert("signature", HeaderValue::from_static(PARAMS));
        assert!(ParsedSignature::from_headers(&headers, HeaderSource::Either).is_err());
        assert!(ParsedSignature::from_headers(&headers, HeaderSource::Signature).is_ok());

        let e = ParsedSignature::from_headers(&HeaderMap::new(), HeaderSource::Either).unwrap_err();
        assert_eq!(e.to_string(), "HTTP authentication header missing signature");
        assert_eq!(e.http_status(), 401);
    }

    #[test]
    fn split_empty() {
        assert!(split_parameters("").unwrap().is_empty());
        assert!(split_parameters("   ").unwrap().is_empty());
    }
}
