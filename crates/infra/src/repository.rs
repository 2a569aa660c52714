//! # リポジトリ実装
//!
//! ## 設計方針
//!
//! - **依存性逆転**: ユースケース層はトレイトに依存し、実装はインフラ層が提供する
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod recipient_repository;

pub use recipient_repository::{PostgresRecipientRepository, RecipientRepository};
