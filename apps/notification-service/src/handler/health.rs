//! # ヘルスチェックハンドラ
//!
//! Notification Service の稼働状態を確認するためのエンドポイント。
//!
//! ```text
//! GET /health
//! ```

use aliasrelay_shared::HealthResponse;
use axum::Json;

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}
