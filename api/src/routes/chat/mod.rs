use std::collections::HashMap;

use axum::http::HeaderMap;

use crate::error_handler::AppError;

pub mod chat_request;
pub mod chat_route;
pub mod chat_stream_route;

/// Resolves the tenant from the `X-API-Key` header against the configured
/// key map.
///
/// # Errors
/// Returns [`AppError::Unauthorized`] when the header is missing, empty,
/// or unknown.
pub(crate) fn require_tenant(
    headers: &HeaderMap,
    api_keys: &HashMap<String, String>,
) -> Result<String, AppError> {
    let key = headers
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if key.is_empty() {
        return Err(AppError::Unauthorized);
    }
    api_keys
        .get(key)
        .cloned()
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> HashMap<String, String> {
        HashMap::from([("dev-key".to_string(), "demo".to_string())])
    }

    #[test]
    fn known_key_resolves_tenant() {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", "dev-key".parse().unwrap());
        assert_eq!(require_tenant(&headers, &keys()).unwrap(), "demo");
    }

    #[test]
    fn missing_or_unknown_key_is_unauthorized() {
        let empty = HeaderMap::new();
        assert!(matches!(
            require_tenant(&empty, &keys()),
            Err(AppError::Unauthorized)
        ));

        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", "wrong".parse().unwrap());
        assert!(matches!(
            require_tenant(&headers, &keys()),
            Err(AppError::Unauthorized)
        ));
    }
}
