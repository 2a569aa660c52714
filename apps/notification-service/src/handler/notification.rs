//! # 通知ハンドラ
//!
//! ホストアプリケーションのジョブワーカーから呼ばれる内部 API。
//!
//! ## エンドポイント
//!
//! - `POST /internal/users/{user_id}/notifications/default-recipient-updated`
//!   - `202 Accepted`: 通知を処理した（送信の成否は問わない）
//!   - `400 Bad Request`: 変更後のデフォルト受信者のメールアドレスが不正

use std::sync::Arc;

use aliasrelay_domain::{
    notification::NotificationContext,
    user::{Email, UserId},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ServiceError, usecase::notification::NotificationService};

/// 通知 API の共有状態
pub struct NotificationState {
    pub service: Arc<NotificationService>,
}

/// デフォルト受信者変更通知リクエスト
#[derive(Debug, Deserialize)]
pub struct DefaultRecipientUpdatedRequest {
    /// 変更前のデフォルト受信者（表示用ラベル）
    pub previous_default_recipient: String,
    /// 変更後のデフォルト受信者のメールアドレス
    pub default_recipient_email:    String,
}

/// デフォルト受信者の変更を通知する
///
/// 通知はレスポンスを返す前に処理する。送信や署名の失敗はレスポンスに影響しない。
pub async fn notify_default_recipient_updated(
    State(state): State<Arc<NotificationState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<DefaultRecipientUpdatedRequest>,
) -> Result<StatusCode, ServiceError> {
    let email = Email::new(req.default_recipient_email)?;
    let context = NotificationContext::new(req.previous_default_recipient, email);

    state
        .service
        .notify_default_recipient_updated(&UserId::from_uuid(user_id), context)
        .await;

    Ok(StatusCode::ACCEPTED)
}
