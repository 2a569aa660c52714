//! # 通知送信
//!
//! メール通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **3 つの実装**: SMTP（Mailpit 開発用）、SES（本番用）、Noop（テスト用）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **二次通知チャネル**: 署名鍵の期限切れアラートは [`KeyExpiryAlert`] で抽象化し、
//!   本通知の送信経路とは独立に差し替えられる
//! - **MIME 組み立ての共通化**: SMTP と SES は同じ [`mime::build_message`] を使い、
//!   `Feedback-ID` ヘッダーと PGP/MIME（RFC 3156）を同じ形で出力する

pub mod mime;
mod noop;
mod ses;
mod smtp;

use aliasrelay_domain::{
    notification::{EmailMessage, NotificationError},
    user::Email,
};
use async_trait::async_trait;
pub use noop::NoopNotificationSender;
pub use ses::SesNotificationSender;
pub use smtp::SmtpNotificationSender;

/// 送信用に組み立て済みのメール
///
/// レンダリング済みの本文と、封緘に成功した場合は ASCII armor 形式の暗号化本文を保持する。
/// 封緘は送信前に済ませておくため、トランスポートは署名ツールキットに触れない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub email:       EmailMessage,
    pub sealed_body: Option<String>,
}

impl OutgoingMail {
    /// 署名なしのメール
    pub fn unsigned(email: EmailMessage) -> Self {
        Self {
            email,
            sealed_body: None,
        }
    }

    /// [`mime::seal_body`] の結果を本文として添付する
    pub fn with_sealed_body(mut self, sealed_body: String) -> Self {
        self.sealed_body = Some(sealed_body);
        self
    }

    pub fn is_signed(&self) -> bool {
        self.sealed_body.is_some()
    }
}

/// メール送信トレイト
///
/// 通知基盤の中核。メール送信の具体的な方法を抽象化する。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    ///
    /// 封緘済みの本文がある場合は PGP/MIME（`multipart/encrypted`）で送信する。
    async fn send_email(&self, mail: &OutgoingMail) -> Result<(), NotificationError>;
}

/// 署名鍵の期限切れアラートを送る二次通知チャネル
///
/// 署名に失敗した受信者に対し、暗号化を無効にしたことを知らせる。
#[async_trait]
pub trait KeyExpiryAlert: Send + Sync {
    /// 受信者に期限切れアラートを 1 通送る
    async fn alert_key_expired(&self, recipient_email: &Email) -> Result<(), NotificationError>;
}
