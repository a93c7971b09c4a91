use serde::{Deserialize, Serialize};

use crate::errors::{AppError, ErrorCode};

/// Response envelope every handler returns (spec.md §6: "All HTTP responses
/// wrap payloads as `{ success, data, error, meta }`").
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageInfo>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None, meta: None }
    }

    pub fn ok_with_meta(data: T, meta: PageInfo) -> Self {
        Self { success: true, data: Some(data), error: None, meta: Some(meta) }
    }
}

impl ApiResponse<()> {
    pub fn err(err: &AppError) -> Self {
        Self { success: false, data: None, error: Some(ErrorBody::from(err)), meta: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        let details = match err {
            AppError::InsufficientStock { available, requested } => Some(serde_json::json!({
                "available": available,
                "requested": requested,
            })),
            AppError::UserLimitExceeded { cap, held } => Some(serde_json::json!({
                "cap": cap,
                "held": held,
            })),
            _ => None,
        };
        Self { code: err.code(), message: err.to_string(), details }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageInfo {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page <= 0 { 0 } else { (total + per_page - 1) / per_page };
        Self { page, per_page, total, total_pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_omits_error_and_meta() {
        let response = ApiResponse::ok(42);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 42);
        assert!(json.get("error").is_none());
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn err_envelope_carries_the_stable_code() {
        let response = ApiResponse::<()>::err(&AppError::NotInQueue);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_IN_QUEUE");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn insufficient_stock_carries_structured_details() {
        let err = AppError::InsufficientStock { available: 2, requested: 5 };
        let body = ErrorBody::from(&err);
        assert_eq!(body.details.unwrap()["available"], 2);
    }

    #[test]
    fn page_info_rounds_up_partial_pages() {
        let info = PageInfo::new(1, 10, 25);
        assert_eq!(info.total_pages, 3);

        let exact = PageInfo::new(1, 10, 20);
        assert_eq!(exact.total_pages, 2);

        let empty = PageInfo::new(1, 0, 20);
        assert_eq!(empty.total_pages, 0);
    }
}
