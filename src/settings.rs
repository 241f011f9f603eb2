use {
    crate::{
        chronoutil::ParseHttpDate, constants::*, ConfigError, HeaderSource, ParsedSignature, SignatureAlgorithm,
        SignatureError,
    },
    chrono::{DateTime, Duration, Utc},
    derive_builder::Builder,
    http::HeaderMap,
    log::trace,
};

/// How to report a declared algorithm this scheme does not accept.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum UnsupportedAlgorithmPolicy {
    /// Reject as a malformed request (400).
    #[default]
    BadRequest,

    /// Reject as unauthenticated (401), with a `Signature` challenge.
    Unauthorized,
}

/// Options fixed when a signature scheme is registered.
///
/// Settings are immutable once built and shared by every request the scheme verifies.
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(build_fn(error = "ConfigError", validate = "Self::validate"), derive(Debug))]
pub struct Settings {
    /// Maximum allowed difference between the request date and the server clock. `None` disables
    /// the check.
    #[builder(default = "Some(Duration::seconds(DEFAULT_CLOCK_SKEW_SECONDS))")]
    clock_skew: Option<Duration>,

    /// Lowercased header names that must appear in the signed header list.
    #[builder(setter(custom), default)]
    required_headers: Vec<String>,

    /// Algorithms this scheme accepts. `None` accepts every supported algorithm.
    #[builder(setter(into, strip_option), default)]
    allowed_algorithms: Option<Vec<SignatureAlgorithm>>,

    /// How to report a declared algorithm that is unknown or not allowed.
    #[builder(default)]
    unsupported_algorithm_policy: UnsupportedAlgorithmPolicy,

    /// Which header forms carry the signature.
    #[builder(default)]
    header_source: HeaderSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clock_skew: Some(Duration::seconds(DEFAULT_CLOCK_SKEW_SECONDS)),
            required_headers: Vec::new(),
            allowed_algorithms: None,
            unsupported_algorithm_policy: UnsupportedAlgorithmPolicy::default(),
            header_source: HeaderSource::default(),
        }
    }
}

impl SettingsBuilder {
    /// Require a header to be signed. May be called multiple times.
    pub fn required_header<S: AsRef<str>>(&mut self, name: S) -> &mut Self {
        self.required_headers.get_or_insert_with(Vec::new).push(name.as_ref().to_ascii_lowercase());
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(Some(skew)) = self.clock_skew {
            if skew < Duration::zero() {
                return Err(ConfigError::InvalidValue(format!("clock_skew must not be negative: {}", skew)));
            }
        }

        if let Some(Some(allowed)) = &self.allowed_algorithms {
            if allowed.is_empty() {
                return Err(ConfigError::InvalidValue("allowed_algorithms must not be empty".to_string()));
            }
        }

        if let Some(required) = &self.required_headers {
            if let Some(name) = required.iter().find(|name| name.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(format!("invalid required header name: '{}'", name)));
            }
        }

        Ok(())
    }
}

impl Settings {
    /// Create a [SettingsBuilder] to construct [Settings].
    #[inline]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Retrieve the allowed clock skew.
    #[inline]
    pub fn clock_skew(&self) -> Option<Duration> {
        self.clock_skew
    }

    /// Retrieve the headers that must be signed.
    #[inline]
    pub fn required_headers(&self) -> &[String] {
        &self.required_headers
    }

    /// Retrieve the allowed algorithms, if restricted.
    #[inline]
    pub fn allowed_algorithms(&self) -> Option<&[SignatureAlgorithm]> {
        self.allowed_algorithms.as_deref()
    }

    /// Retrieve the unsupported algorithm policy.
    #[inline]
    pub fn unsupported_algorithm_policy(&self) -> UnsupportedAlgorithmPolicy {
        self.unsupported_algorithm_policy
    }

    /// Retrieve the accepted header forms.
    #[inline]
    pub fn header_source(&self) -> HeaderSource {
        self.header_source
    }

    /// Check a parsed signature against the algorithm allow-list and the required header list.
    pub(crate) fn check_policy(&self, parsed: &ParsedSignature) -> Result<(), SignatureError> {
        if let Some(allowed) = self.allowed_algorithms() {
            if !allowed.contains(&parsed.algorithm()) {
                trace!("check_policy: algorithm {} is not allowed", parsed.algorithm());
                return Err(SignatureError::UnsupportedAlgorithm(parsed.algorithm().to_string()));
            }
        }

        for required in self.required_headers() {
            if !parsed.headers().iter().any(|signed| signed == required) {
                trace!("check_policy: required header {} is not signed", required);
                return Err(SignatureError::RequiredHeaderNotSigned(required.clone()));
            }
        }

        Ok(())
    }

    /// Check the signed `X-Date` or `Date` header against the server clock.
    ///
    /// Only a date covered by the signature counts. Requests that sign neither header pass; sign
    /// `date` via [`required_header`][SettingsBuilder::required_header] to make it mandatory.
    pub(crate) fn check_clock_skew(
        &self,
        parsed: &ParsedSignature,
        headers: &HeaderMap,
        server_timestamp: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let Some(allowed_mismatch) = self.clock_skew else {
            return Ok(());
        };

        let is_signed = |name: &str| parsed.headers().iter().any(|signed| signed == name);
        let Some(value) = [HDR_X_DATE, HDR_DATE]
            .into_iter()
            .filter(|name| is_signed(*name))
            .find_map(|name| headers.get(name))
        else {
            trace!("check_clock_skew: request carries no signed date");
            return Ok(());
        };

        let value = value.to_str().map_err(|_| {
            let value = String::from_utf8_lossy(value.as_bytes());
            SignatureError::InvalidDate(format!("Date header is not valid: {}", value))
        })?;
        let req_ts = DateTime::<Utc>::parse_from_http_date(value)
            .map_err(|_| SignatureError::InvalidDate(format!("Date header is not valid: {}", value)))?;

        let min_ts = server_timestamp.checked_sub_signed(allowed_mismatch).unwrap_or(server_timestamp);
        let max_ts = server_timestamp.checked_add_signed(allowed_mismatch).unwrap_or(server_timestamp);

        if req_ts < min_ts {
            trace!("check_clock_skew: request timestamp {} is before minimum timestamp {}", req_ts, min_ts);
            return Err(SignatureError::ExpiredRequest(format!(
                "Request date {} is earlier than {} ({} - {}.)",
                req_ts.format(HTTP_DATE_FORMAT),
                min_ts.format(HTTP_DATE_FORMAT),
                server_timestamp.format(HTTP_DATE_FORMAT),
                duration_to_string(allowed_mismatch)
            )));
        }

        if req_ts > max_ts {
            trace!("check_clock_skew: request timestamp {} is after maximum timestamp {}", req_ts, max_ts);
            return Err(SignatureError::ExpiredRequest(format!(
                "Request date {} is later than {} ({} + {}.)",
                req_ts.format(HTTP_DATE_FORMAT),
                max_ts.format(HTTP_DATE_FORMAT),
                server_timestamp.format(HTTP_DATE_FORMAT),
                duration_to_string(allowed_mismatch)
            )));
        }

        Ok(())
    }
}

fn duration_to_string(duration: Duration) -> String {
    let secs = duration.num_seconds();
    if secs % 60 == 0 {
        format!("{} min", duration.num_minutes())
    } else {
        format!("{} sec", secs)
    }
}
