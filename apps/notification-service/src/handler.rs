//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、通知の組み立てと送信はユースケース層に委譲

pub mod health;
pub mod notification;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
pub use health::health_check;
pub use notification::{
    DefaultRecipientUpdatedRequest,
    NotificationState,
    notify_default_recipient_updated,
};

use crate::usecase::notification::NotificationService;

/// ルーターを構築する
///
/// トレース用のレイヤーは呼び出し側（`main`）で追加する。
pub fn router(service: Arc<NotificationService>) -> Router {
    let notification_state = Arc::new(NotificationState { service });

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/internal/users/{user_id}/notifications/default-recipient-updated",
            post(notify_default_recipient_updated),
        )
        .with_state(notification_state)
}
