//! # 通知
//!
//! アカウント通知メールに関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`AccountNotification`] | アカウント通知イベント | デフォルト受信者の変更、GPG 鍵の失効 |
//! | [`NotificationContext`] | 通知コンテキスト | 変更前のデフォルト受信者と現在の宛先 |
//! | [`SigningError`] | 署名不可 | 署名ツールキット・鍵の問題。常に「署名なしで送信」に縮退する |
//!
//! ## 設計方針
//!
//! - **enum による通知イベント**: 各バリアントが送信する通知メール 1 種類に対応
//! - **fire-and-forget**: 通知送信の失敗は呼び出し元に影響しない
//! - **テンプレート分離**: 通知イベントとメール生成は分離（TemplateRenderer は notification-service）

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::{recipient::Fingerprint, user::Email};

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),

    /// MIME メッセージの組み立てに失敗（PGP/MIME の封緘を含む）
    #[error("メッセージ組み立てに失敗: {0}")]
    CompositionFailed(String),
}

/// 署名不可エラー
///
/// 署名ツールキットや鍵に起因する失敗。どのバリアントも恒久的な失敗として扱い、
/// 呼び出し元には伝播させない（署名なしで送信し、受信者の暗号化を無効化する）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// 組織の署名鍵が設定されていない
    #[error("署名鍵が設定されていません")]
    NotConfigured,

    /// 署名ツールキットを実行できない
    #[error("署名ツールキットを利用できません: {0}")]
    ToolkitUnavailable(String),

    /// 鍵がキーリングに存在しない
    #[error("鍵が見つかりません: {fingerprint}")]
    KeyNotFound {
        /// 検索した鍵のフィンガープリント
        fingerprint: Fingerprint,
    },

    /// 鍵は存在するが使用できない（失効・期限切れ・無効化など）
    #[error("鍵を使用できません: {fingerprint}（{reason}）")]
    KeyUnusable {
        /// 対象の鍵のフィンガープリント
        fingerprint: Fingerprint,
        /// 使用できない理由
        reason:      String,
    },

    /// 署名・暗号化処理そのものに失敗
    #[error("署名に失敗: {0}")]
    SealFailed(String),
}

/// 通知イベント種別
///
/// ログの `notification.event_type` フィールドに出力される値。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationEventType {
    /// デフォルト受信者が変更された → 新しいデフォルト受信者に送信
    DefaultRecipientUpdated,
    /// 受信者の GPG 鍵が使用できなくなった → 該当受信者に送信
    GpgKeyExpired,
}

/// 通知チャネル
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    Mail,
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:          String,
    /// 件名
    pub subject:     String,
    /// HTML 本文
    pub html_body:   String,
    /// プレーンテキスト本文
    pub text_body:   String,
    /// `Feedback-ID` ヘッダーの値（例: `DRU:aliasrelay`）
    pub feedback_id: Option<String>,
}

/// デフォルト受信者変更通知のコンテキスト
///
/// 通知ジョブ作成時に一度だけ構築され、送信時に一度だけ消費される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContext {
    previous_default_recipient_label: String,
    current_recipient_email:          Email,
}

impl NotificationContext {
    pub fn new(previous_default_recipient_label: impl Into<String>, current_recipient_email: Email) -> Self {
        Self {
            previous_default_recipient_label: previous_default_recipient_label.into(),
            current_recipient_email,
        }
    }

    /// 変更前のデフォルト受信者（表示用ラベル）
    pub fn previous_default_recipient_label(&self) -> &str {
        &self.previous_default_recipient_label
    }

    /// 変更後のデフォルト受信者のメールアドレス
    pub fn current_recipient_email(&self) -> &Email {
        &self.current_recipient_email
    }
}

/// アカウント通知イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountNotification {
    /// デフォルト受信者の変更
    DefaultRecipientUpdated { context: NotificationContext },
    /// 受信者の GPG 鍵が期限切れ・無効
    GpgKeyExpired { recipient_email: Email },
}

impl AccountNotification {
    /// 通知イベント種別を返す
    pub fn event_type(&self) -> NotificationEventType {
        match self {
            Self::DefaultRecipientUpdated { .. } => NotificationEventType::DefaultRecipientUpdated,
            Self::GpgKeyExpired { .. } => NotificationEventType::GpgKeyExpired,
        }
    }

    /// 配信チャネルを返す
    pub fn channels(&self) -> &'static [Channel] {
        &[Channel::Mail]
    }

    /// 受信者のメールアドレスを返す
    pub fn recipient_email(&self) -> &Email {
        match self {
            Self::DefaultRecipientUpdated { context } => context.current_recipient_email(),
            Self::GpgKeyExpired { recipient_email } => recipient_email,
        }
    }

    /// `Feedback-ID` ヘッダーのキャンペーンコード
    pub fn feedback_code(&self) -> &'static str {
        match self {
            Self::DefaultRecipientUpdated { .. } => "DRU",
            Self::GpgKeyExpired { .. } => "GKE",
        }
    }

    /// `Feedback-ID` ヘッダーの値を組み立てる
    pub fn feedback_id(&self, product_tag: &str) -> String {
        format!("{}:{product_tag}", self.feedback_code())
    }
}
