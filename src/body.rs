//! Request body collection for payload validation.
use {bytes::Bytes, std::future::Future, tower::BoxError};

/// A body type that can be read fully into memory so a payload validator can inspect it.
///
/// The body is collected before authentication so it can be validated and then handed to the
/// inner service.
pub trait IntoRequestBytes {
    /// Read the entire body into a [`Bytes`] object.
    fn into_request_bytes(self) -> impl Future<Output = Result<Bytes, BoxError>> + Send + Sync;
}

/// An empty body.
impl IntoRequestBytes for () {
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(Bytes::new())
    }
}

impl IntoRequestBytes for Vec<u8> {
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(Bytes::from(self))
    }
}

impl IntoRequestBytes for String {
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(Bytes::from(self))
    }
}

impl IntoRequestBytes for &'static str {
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(Bytes::from_static(self.as_bytes()))
    }
}

/// Identity transformation.
impl IntoRequestBytes for Bytes {
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use {super::IntoRequestBytes, bytes::Bytes};

    #[tokio::test]
    async fn test_into_request_bytes() {
        assert!(().into_request_bytes().await.unwrap().is_empty());
        assert_eq!(b"abc".to_vec().into_request_bytes().await.unwrap(), Bytes::from_static(b"abc"));
        assert_eq!("{\"a\":1}".to_string().into_request_bytes().await.unwrap(), Bytes::from_static(b"{\"a\":1}"));
        assert_eq!("hello".into_request_bytes().await.unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(Bytes::from_static(b"xyz").into_request_bytes().await.unwrap(), Bytes::from_static(b"xyz"));
    }
}
