// src/middleware/target.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{common::error::AppError, models::access::RequestTarget};

pub const COMPANY_ID_HEADER: &str = "x-company-id";
pub const LOCATION_ID_HEADER: &str = "x-location-id";

// Cabeçalho ausente é `None`; presente e mal formado é erro 400
fn uuid_header(headers: &HeaderMap, name: &'static str) -> Result<Option<Uuid>, AppError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(Some)
            .ok_or(AppError::InvalidHeader(name)),
    }
}

impl RequestTarget {
    /// Alvo declarado nos cabeçalhos `X-Company-Id` / `X-Location-Id`.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        Ok(RequestTarget {
            company_id: uuid_header(headers, COMPANY_ID_HEADER)?,
            location_id: uuid_header(headers, LOCATION_ID_HEADER)?,
        })
    }
}

impl<S> FromRequestParts<S> for RequestTarget
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        RequestTarget::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_both_headers() {
        let company_id = Uuid::new_v4();
        let location_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(COMPANY_ID_HEADER, HeaderValue::from_str(&company_id.to_string()).unwrap());
        headers.insert(LOCATION_ID_HEADER, HeaderValue::from_str(&location_id.to_string()).unwrap());

        let target = RequestTarget::from_headers(&headers).unwrap();
        assert_eq!(target.company_id, Some(company_id));
        assert_eq!(target.location_id, Some(location_id));
    }

    #[test]
    fn missing_headers_mean_no_target() {
        assert_eq!(RequestTarget::from_headers(&HeaderMap::new()).unwrap(), RequestTarget::default());
    }

    #[test]
    fn malformed_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION_ID_HEADER, HeaderValue::from_static("loja-1"));

        let err = RequestTarget::from_headers(&headers).unwrap_err();
        assert!(matches!(err, AppError::InvalidHeader(LOCATION_ID_HEADER)));
    }
}
