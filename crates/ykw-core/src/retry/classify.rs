//! Map API errors onto retry classifications.

use crate::api::ApiError;

use super::ErrorKind;

/// Classify an [`ApiError`] for the retry policy. Decode failures inside the
/// HTTP client are shape problems, not transport ones.
pub fn classify(err: &ApiError) -> ErrorKind {
    match err {
        ApiError::Transport(e) if e.is_decode() => ErrorKind::Shape,
        ApiError::Transport(_) | ApiError::Status(_) => ErrorKind::Transport,
        ApiError::Api { .. } => ErrorKind::Api,
        ApiError::Shape(_) => ErrorKind::Shape,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_transport() {
        assert_eq!(classify(&ApiError::Status(502)), ErrorKind::Transport);
    }

    #[test]
    fn api_envelope_failure_is_api() {
        let err = ApiError::api(Some(4), Some("forbidden".to_string()));
        assert_eq!(classify(&err), ErrorKind::Api);
    }

    #[test]
    fn shape_mismatch_is_shape() {
        let err = ApiError::Shape("missing field `data`".to_string());
        assert_eq!(classify(&err), ErrorKind::Shape);
    }
}
