//! # 通知ユースケース
//!
//! アカウント通知の署名判定・署名ハンドル取得・メール組み立て・送信を統合する。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - tera テンプレートエンジンによるメール生成
//! - [`signing`] - 署名判定と署名ハンドルの取得
//! - [`compose`] - レンダリング結果と署名ハンドルから送信用メールを組み立てる
//! - [`alert`] - 署名鍵の期限切れアラート（メール実装）
//! - [`service`] - 上記を束ねる fire-and-forget の通知サービス

pub mod alert;
pub mod compose;
pub mod service;
pub mod signing;
pub mod template_renderer;

pub use alert::MailKeyExpiryAlert;
pub use compose::compose;
pub use service::NotificationService;
pub use signing::{SigningOutcome, acquire_signer, decide_signing};
pub use template_renderer::TemplateRenderer;
