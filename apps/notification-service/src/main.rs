//! # Notification Service サーバー
//!
//! アカウント通知（デフォルト受信者の変更）を組み立てて送信する内部サービス。
//!
//! ## 役割
//!
//! - **署名判定**: 受信者の暗号化設定に従い、gpg で PGP/MIME 署名・暗号化する
//! - **失敗時の後始末**: 署名できなければ署名なしで送信し、受信者の暗号化を無効化して
//!   期限切れアラートを送る
//! - **メール送信**: SMTP / SES / Noop を `NOTIFICATION_BACKEND` で切り替える
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `NOTIFIER_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `NOTIFIER_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `NOTIFICATION_BACKEND` | No | `smtp` / `ses` / `noop`（デフォルト: `noop`） |
//! | `SMTP_HOST` / `SMTP_PORT` | No | SMTP リレー（デフォルト: `localhost` / `1025`） |
//! | `NOTIFICATION_FROM_ADDRESS` | No | 送信元アドレス |
//! | `NOTIFICATION_PRODUCT_TAG` | No | `Feedback-ID` のプロダクトタグ（デフォルト: `aliasrelay`） |
//! | `SIGNING_KEY_FINGERPRINT` | No | 組織の署名鍵。未設定なら署名は常に失敗扱い |
//! | `GPG_KEYRING_PATH` | No | キーリング（デフォルト: `~/.gnupg`） |
//! | `GPG_BINARY` | No | gpg バイナリ（デフォルト: `gpg`） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! NOTIFIER_PORT=3002 DATABASE_URL=postgres://... cargo run -p aliasrelay-notification-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use aliasrelay_infra::{
    db,
    notification::{
        NoopNotificationSender,
        NotificationSender,
        SesNotificationSender,
        SmtpNotificationSender,
    },
    repository::PostgresRecipientRepository,
    signing::GpgSignerFactory,
};
use aliasrelay_notification_service::{
    config::{NotificationBackend, NotificationConfig, NotifierConfig},
    handler,
    usecase::notification::{MailKeyExpiryAlert, NotificationService, TemplateRenderer},
};
use aliasrelay_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Notification Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(&TracingConfig::from_env("notification-service"));

    let config = NotifierConfig::from_env()?;

    tracing::info!(
        "Notification Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("データベースに接続しました");
    db::run_migrations(&pool).await?;

    let sender = build_sender(&config.notification).await;
    let renderer = Arc::new(TemplateRenderer::new()?);
    let alert = MailKeyExpiryAlert::new(
        sender.clone(),
        renderer.clone(),
        config.notification.product_tag.clone(),
    );

    if config.signing.signing_key.is_none() {
        tracing::warn!("SIGNING_KEY_FINGERPRINT が未設定のため、暗号化を希望する受信者への署名は失敗扱いになります");
    }

    let service = NotificationService::new(
        sender,
        renderer,
        Arc::new(PostgresRecipientRepository::new(pool)),
        Arc::new(GpgSignerFactory::with_path(config.signing.gpg_binary.clone())),
        Arc::new(alert),
        config.signing.clone(),
        config.notification.product_tag.clone(),
    );

    let app = handler::router(Arc::new(service)).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Notification Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// 設定に応じた送信バックエンドを構築する
async fn build_sender(config: &NotificationConfig) -> Arc<dyn NotificationSender> {
    match config.backend {
        NotificationBackend::Smtp => {
            tracing::info!(
                "通知バックエンド: SMTP ({}:{})",
                config.smtp_host,
                config.smtp_port
            );
            Arc::new(SmtpNotificationSender::new(
                &config.smtp_host,
                config.smtp_port,
                config.from_address.clone(),
            ))
        }
        NotificationBackend::Ses => {
            tracing::info!("通知バックエンド: SES");
            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await;
            Arc::new(SesNotificationSender::new(
                aws_sdk_sesv2::Client::new(&aws_config),
                config.from_address.clone(),
            ))
        }
        NotificationBackend::Noop => {
            tracing::info!("通知バックエンド: Noop（送信しません）");
            Arc::new(NoopNotificationSender)
        }
    }
}
