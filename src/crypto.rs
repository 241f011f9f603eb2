use {
    crate::SignatureAlgorithm,
    hmac::{digest::KeyInit, Hmac, Mac},
    log::{debug, trace},
    ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm},
    sha1::Sha1,
    sha2::{Sha256, Sha512},
    std::fmt::{Debug, Formatter, Result as FmtResult},
    subtle::ConstantTimeEq,
};

/// Key material returned by a credential resolver.
///
/// The variant must match the family of the algorithm the client declared; a mismatch never
/// verifies.
#[derive(Clone, Eq, PartialEq)]
pub enum VerificationKey {
    /// A shared secret for the `hmac-*` algorithms.
    Hmac(Vec<u8>),

    /// An RSA public key for the `rsa-*` algorithms, as a DER-encoded PKCS#1 `RSAPublicKey`.
    RsaPkcs1(Vec<u8>),

    /// An ECDSA public key for the `ecdsa-*` algorithms, as an uncompressed SEC1 point.
    Ecdsa(Vec<u8>),

    /// A 32-byte Ed25519 public key.
    Ed25519(Vec<u8>),
}

impl VerificationKey {
    /// Create an HMAC shared-secret key.
    pub fn hmac<K: Into<Vec<u8>>>(secret: K) -> Self {
        Self::Hmac(secret.into())
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Hmac(k) | Self::RsaPkcs1(k) | Self::Ecdsa(k) | Self::Ed25519(k) => k,
        }
    }
}

impl Debug for VerificationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Hmac(_) => f.write_str("VerificationKey::Hmac"),
            Self::RsaPkcs1(k) => write!(f, "VerificationKey::RsaPkcs1({})", hex::encode(k)),
            Self::Ecdsa(k) => write!(f, "VerificationKey::Ecdsa({})", hex::encode(k)),
            Self::Ed25519(k) => write!(f, "VerificationKey::Ed25519({})", hex::encode(k)),
        }
    }
}

/// Verify `signature` over `message`. The routine is selected by `algorithm` alone.
pub(crate) fn verify_signature(
    algorithm: SignatureAlgorithm,
    key: &VerificationKey,
    message: &[u8],
    signature: &[u8],
) -> bool {
    use SignatureAlgorithm::*;

    match (algorithm, key) {
        (HmacSha1, VerificationKey::Hmac(secret)) => hmac_matches::<Hmac<Sha1>>(secret, message, signature),
        (HmacSha256, VerificationKey::Hmac(secret)) => hmac_matches::<Hmac<Sha256>>(secret, message, signature),
        (HmacSha512, VerificationKey::Hmac(secret)) => hmac_matches::<Hmac<Sha512>>(secret, message, signature),
        (RsaSha1, VerificationKey::RsaPkcs1(public_key)) => {
            public_key_matches(&signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY, public_key, message, signature)
        }
        (RsaSha256, VerificationKey::RsaPkcs1(public_key)) => {
            public_key_matches(&signature::RSA_PKCS1_2048_8192_SHA256, public_key, message, signature)
        }
        (RsaSha512, VerificationKey::RsaPkcs1(public_key)) => {
            public_key_matches(&signature::RSA_PKCS1_2048_8192_SHA512, public_key, message, signature)
        }
        (EcdsaSha256, VerificationKey::Ecdsa(public_key)) => {
            public_key_matches(&signature::ECDSA_P256_SHA256_ASN1, public_key, message, signature)
        }
        (EcdsaSha384, VerificationKey::Ecdsa(public_key)) => {
            public_key_matches(&signature::ECDSA_P384_SHA384_ASN1, public_key, message, signature)
        }
        (Ed25519, VerificationKey::Ed25519(public_key)) => {
            public_key_matches(&signature::ED25519, public_key, message, signature)
        }
        (algorithm, key) => {
            debug!("verify_signature: {:?} cannot be used with algorithm {}", key, algorithm);
            false
        }
    }
}

/// Compute the MAC and compare it against `signature` in constant time.
#[inline(always)]
fn hmac_matches<M: Mac + KeyInit>(secret: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let mut mac = match <M as KeyInit>::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    Mac::update(&mut mac, message);
    let expected = mac.finalize().into_bytes();
    let is_equal: bool = expected.as_slice().ct_eq(signature).into();
    if !is_equal {
        trace!("HMAC mismatch for presented signature '{}'", hex::encode(signature));
    }
    is_equal
}

#[inline(always)]
fn public_key_matches(
    algorithm: &'static dyn VerificationAlgorithm,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> bool {
    match UnparsedPublicKey::new(algorithm, public_key).verify(message, signature) {
        Ok(()) => true,
        Err(_) => {
            trace!("Public key signature did not verify");
            false
        }
    }
}
