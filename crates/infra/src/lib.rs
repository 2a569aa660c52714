//! # AliasRelay インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! 通知の組み立てに必要な外部協調者（受信者ストア、署名ツールキット、メール送信）を
//! それぞれ trait で抽象化し、具体的な実装を提供する。ユースケース層は trait のみに依存する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **リポジトリ実装**: 受信者の取得と暗号化設定の更新
//! - **署名**: gpg による PGP/MIME 署名・暗号化
//! - **メール送信**: SMTP / SES / Noop
//!
//! ## 依存関係
//!
//! ```text
//! notification-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - メール送信と MIME 組み立て
//! - [`repository`] - リポジトリ実装
//! - [`signing`] - 署名ツールキット

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;
pub mod signing;

pub use error::InfraError;
