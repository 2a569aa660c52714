//! # Notification Service エラー定義
//!
//! HTTP ハンドラで発生するエラーと、RFC 9457 Problem Details への変換を定義する。
//!
//! 通知の送信失敗や署名失敗はここには現れない。どちらもユースケース内で処理され、
//! 呼び出し元には伝播しない。

use aliasrelay_domain::DomainError;
use aliasrelay_shared::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Notification Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::BadRequest(msg),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServiceError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::validation_error(msg.clone()),
            ),
        };

        (status, Json(body)).into_response()
    }
}
