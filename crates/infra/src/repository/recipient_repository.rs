//! # RecipientRepository
//!
//! 受信者の取得と暗号化設定の更新を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **最小の書き込み**: このサービスが更新するのは `should_encrypt` のみ
//! - **冪等な無効化**: `disable_encryption` は何度呼んでも同じ結果になる

use aliasrelay_domain::{
    recipient::{Fingerprint, Recipient, RecipientId, RecipientPreference},
    user::{Email, UserId},
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::InfraError;

/// 受信者リポジトリトレイト
#[async_trait]
pub trait RecipientRepository: Send + Sync {
    /// ユーザーのデフォルト受信者を取得する
    ///
    /// デフォルト受信者が未設定の場合は `None`。
    async fn find_default_by_user(&self, user_id: &UserId) -> Result<Option<Recipient>, InfraError>;

    /// 受信者の暗号化を無効にする（冪等）
    async fn disable_encryption(&self, recipient_id: &RecipientId) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の RecipientRepository
#[derive(Debug, Clone)]
pub struct PostgresRecipientRepository {
    pool: PgPool,
}

impl PostgresRecipientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 保存されたフィンガープリントを検証する
///
/// `should_encrypt` が false の行では検証しない。暗号化無効の受信者に壊れた値が残っていても
/// 通知は止めない。空白だけの値は未登録と同じく `None` とする。
fn stored_fingerprint(
    should_encrypt: bool,
    raw: Option<String>,
) -> Result<Option<Fingerprint>, InfraError> {
    if !should_encrypt {
        return Ok(None);
    }

    raw.filter(|value| !value.trim().is_empty())
        .map(Fingerprint::new)
        .transpose()
        .map_err(|e| InfraError::invalid_data(e.to_string()))
}

/// DB の行を Recipient に変換する
fn recipient_from_row(row: &PgRow) -> Result<Recipient, InfraError> {
    let email: String = row.try_get("email")?;
    let email = Email::new(email).map_err(|e| InfraError::invalid_data(e.to_string()))?;

    let should_encrypt: bool = row.try_get("should_encrypt")?;
    let fingerprint = stored_fingerprint(should_encrypt, row.try_get("fingerprint")?)?;

    Ok(Recipient::new(
        RecipientId::from_uuid(row.try_get("id")?),
        UserId::from_uuid(row.try_get("user_id")?),
        email,
        RecipientPreference::new(should_encrypt, fingerprint),
    ))
}

#[async_trait]
impl RecipientRepository for PostgresRecipientRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
    async fn find_default_by_user(&self, user_id: &UserId) -> Result<Option<Recipient>, InfraError> {
        let row = sqlx::query(
            r#"
            SELECT r.id, r.user_id, r.email, r.should_encrypt, r.fingerprint
            FROM users u
            INNER JOIN recipients r ON r.id = u.default_recipient_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(recipient_from_row).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%recipient_id))]
    async fn disable_encryption(&self, recipient_id: &RecipientId) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE recipients
            SET should_encrypt = false, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(recipient_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
