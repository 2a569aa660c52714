//! # AliasRelay 共有ユーティリティ
//!
//! ドメイン・インフラ・サービスの全クレートから使われる共通ユーティリティ。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum などのフレームワークには依存しない（レスポンス変換は各サービスの責務）
//! - トレーシング初期化は `observability` feature の背後に置く

pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use error_response::ErrorResponse;
pub use health::HealthResponse;
