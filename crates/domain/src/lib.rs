//! # AliasRelay ドメイン層
//!
//! アカウント通知の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: メールアドレスや鍵フィンガープリントは生成時に検証する
//! - **エンティティ**: 受信者（Recipient）は ID を持ち、暗号化設定を保持する
//! - **I/O を持たない**: DB・SMTP・gpg などの外部システムには一切依存しない
//!
//! ## 依存関係の方向
//!
//! ```text
//! notification-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`user`] - ユーザー ID とメールアドレス
//! - [`recipient`] - 受信者と暗号化設定、署名判定
//! - [`notification`] - 通知イベント、メールメッセージ、通知・署名エラー
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use aliasrelay_domain::recipient::{Fingerprint, RecipientPreference};
//!
//! let preference = RecipientPreference::new(true, Some(Fingerprint::new("ABC123")?));
//! assert_eq!(
//!     preference.signing_fingerprint().map(Fingerprint::as_str),
//!     Some("ABC123")
//! );
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod error;
pub mod notification;
pub mod recipient;
pub mod user;

pub use error::DomainError;
