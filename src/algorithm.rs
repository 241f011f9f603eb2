//! Signature algorithm identifiers.
use {
    crate::SignatureError,
    std::{
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// The signature algorithms this crate can verify, as named in the `algorithm` signature parameter.
///
/// The verification routine is always chosen from this value and never from the shape of the key
/// material returned by the credential resolver.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SignatureAlgorithm {
    /// `hmac-sha1`
    HmacSha1,
    /// `hmac-sha256`
    HmacSha256,
    /// `hmac-sha512`
    HmacSha512,
    /// `rsa-sha1`: RSASSA-PKCS1-v1_5 using SHA-1.
    RsaSha1,
    /// `rsa-sha256`: RSASSA-PKCS1-v1_5 using SHA-256.
    RsaSha256,
    /// `rsa-sha512`: RSASSA-PKCS1-v1_5 using SHA-512.
    RsaSha512,
    /// `ecdsa-sha256`: ECDSA over P-256 with an ASN.1 DER encoded signature.
    EcdsaSha256,
    /// `ecdsa-sha384`: ECDSA over P-384 with an ASN.1 DER encoded signature.
    EcdsaSha384,
    /// `ed25519`
    Ed25519,
}

impl SignatureAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [SignatureAlgorithm; 9] = [
        Self::HmacSha1,
        Self::HmacSha256,
        Self::HmacSha512,
        Self::RsaSha1,
        Self::RsaSha256,
        Self::RsaSha512,
        Self::EcdsaSha256,
        Self::EcdsaSha384,
        Self::Ed25519,
    ];

    /// The wire name of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha256 => "hmac-sha256",
            Self::HmacSha512 => "hmac-sha512",
            Self::RsaSha1 => "rsa-sha1",
            Self::RsaSha256 => "rsa-sha256",
            Self::RsaSha512 => "rsa-sha512",
            Self::EcdsaSha256 => "ecdsa-sha256",
            Self::EcdsaSha384 => "ecdsa-sha384",
            Self::Ed25519 => "ed25519",
        }
    }
}

impl Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = SignatureError;

    /// Parse an algorithm name. Matching is case-insensitive; unknown names are rejected rather
    /// than mapped to a default.
    fn from_str(s: &str) -> Result<Self, SignatureError> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .find(|alg| alg.as_str() == lower)
            .copied()
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{SignatureAlgorithm, SignatureError},
        std::str::FromStr,
    };

    #[test_log::test]
    fn test_names() {
        for alg in SignatureAlgorithm::ALL {
            assert_eq!(SignatureAlgorithm::from_str(alg.as_str()).unwrap(), alg);
            assert_eq!(alg.to_string(), alg.as_str());
        }

        assert_eq!(SignatureAlgorithm::from_str("HMAC-SHA256").unwrap(), SignatureAlgorithm::HmacSha256);
    }

    #[test_log::test]
    fn test_unknown() {
        match SignatureAlgorithm::from_str("hmac-md5") {
            Err(SignatureError::UnsupportedAlgorithm(alg)) => assert_eq!(alg, "hmac-md5"),
            other => panic!("Unexpected result: {:?}", other),
        }

        // No silent downgrade for a bare hash name.
        assert!(SignatureAlgorithm::from_str("sha256").is_err());
        assert!(SignatureAlgorithm::from_str("").is_err());
    }
}
