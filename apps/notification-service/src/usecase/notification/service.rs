//! # 通知サービス
//!
//! 受信者の取得 → 署名判定 → メール組み立て → 封緘 → 送信を統合するサービス。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: `notify_default_recipient_updated()` は何が失敗してもエラーを返さない
//! - **署名失敗は恒久的**: ツールキットの失敗理由は区別しない。リトライせず、
//!   署名なしで送信したうえで受信者の暗号化を無効化し、期限切れアラートを 1 通送る
//! - **依存性注入**: ストア・ツールキット・送信・アラートはすべて trait で抽象化

use std::sync::Arc;

use aliasrelay_domain::{
    notification::{AccountNotification, Channel, NotificationContext, SigningError},
    recipient::Recipient,
    user::UserId,
};
use aliasrelay_infra::{
    notification::{KeyExpiryAlert, NotificationSender, OutgoingMail, mime},
    repository::RecipientRepository,
    signing::SignerFactory,
};
use aliasrelay_shared::{
    event_log::{error, event},
    log_business_event,
};

use super::{SigningOutcome, TemplateRenderer, compose, decide_signing};
use crate::config::SigningConfig;

/// 通知サービス
///
/// `Arc<NotificationService>` として axum ハンドラ間で共有する。
pub struct NotificationService {
    sender:         Arc<dyn NotificationSender>,
    renderer:       Arc<TemplateRenderer>,
    recipients:     Arc<dyn RecipientRepository>,
    signer_factory: Arc<dyn SignerFactory>,
    alert:          Arc<dyn KeyExpiryAlert>,
    signing:        SigningConfig,
    product_tag:    String,
}

impl NotificationService {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        renderer: Arc<TemplateRenderer>,
        recipients: Arc<dyn RecipientRepository>,
        signer_factory: Arc<dyn SignerFactory>,
        alert: Arc<dyn KeyExpiryAlert>,
        signing: SigningConfig,
        product_tag: String,
    ) -> Self {
        Self {
            sender,
            renderer,
            recipients,
            signer_factory,
            alert,
            signing,
            product_tag,
        }
    }

    /// デフォルト受信者の変更を通知する（fire-and-forget）
    ///
    /// 受信者レコードを取得できない場合は `should_encrypt = false` とみなし、署名なしで送る。
    /// 署名ハンドルの取得でも封緘でも、失敗すれば同じ後始末を行って署名なしで送る。
    #[tracing::instrument(skip_all, fields(%user_id))]
    pub async fn notify_default_recipient_updated(
        &self,
        user_id: &UserId,
        context: NotificationContext,
    ) {
        let notification = AccountNotification::DefaultRecipientUpdated { context };
        let recipient = self.load_default_recipient(user_id).await;

        let outcome = match &recipient {
            Some(recipient) => {
                decide_signing(
                    self.signer_factory.as_ref(),
                    &self.signing,
                    recipient.preference(),
                )
                .await
            }
            None => SigningOutcome::Unsigned,
        };

        let signer = match outcome {
            SigningOutcome::Signed(signer) => Some(signer),
            SigningOutcome::Unsigned => None,
            SigningOutcome::Failed(err) => {
                if let Some(recipient) = &recipient {
                    self.handle_signing_failure(recipient, &err).await;
                }
                None
            }
        };

        let Some(mail) = self.compose_mail(&notification) else {
            return;
        };

        let mail = match signer {
            Some(signer) => match mime::seal_body(signer.as_ref(), &mail.email).await {
                Ok(sealed) => mail.with_sealed_body(sealed),
                Err(err) => {
                    if let Some(recipient) = &recipient {
                        self.handle_signing_failure(recipient, &err).await;
                    }
                    mail
                }
            },
            None => mail,
        };

        self.dispatch(&notification, &mail).await;
    }

    /// 署名失敗時の後始末
    ///
    /// 何度呼んでも `should_encrypt = false` のまま。失敗はログ出力のみで送信は止めない。
    async fn handle_signing_failure(&self, recipient: &Recipient, err: &SigningError) {
        tracing::warn!(
            error.category = error::category::EXTERNAL_SERVICE,
            error.kind = error::kind::SIGNING,
            recipient.id = %recipient.id(),
            error = %err,
            "署名ハンドルを取得できないため、署名なしで送信します"
        );

        match self.recipients.disable_encryption(recipient.id()).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::RECIPIENT,
                    event.action = event::action::ENCRYPTION_DISABLED,
                    event.entity_type = event::entity_type::RECIPIENT,
                    event.entity_id = %recipient.id(),
                    event.result = event::result::SUCCESS,
                    reason = %err,
                    "受信者の暗号化を無効化"
                );
            }
            Err(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::DATABASE,
                    recipient.id = %recipient.id(),
                    error = %e,
                    span_trace = %e.span_trace(),
                    "受信者の暗号化の無効化に失敗"
                );
            }
        }

        if let Err(e) = self.alert.alert_key_expired(recipient.email()).await {
            tracing::error!(
                error.category = error::category::EXTERNAL_SERVICE,
                error.kind = error::kind::MAIL_TRANSPORT,
                recipient.id = %recipient.id(),
                error = %e,
                "期限切れアラートの送信に失敗"
            );
        }
    }

    async fn load_default_recipient(&self, user_id: &UserId) -> Option<Recipient> {
        match self.recipients.find_default_by_user(user_id).await {
            Ok(Some(recipient)) => Some(recipient),
            Ok(None) => {
                tracing::debug!("デフォルト受信者のレコードがないため署名なしで送信します");
                None
            }
            Err(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::DATABASE,
                    error = %e,
                    span_trace = %e.span_trace(),
                    "デフォルト受信者の取得に失敗したため署名なしで送信します"
                );
                None
            }
        }
    }

    fn compose_mail(&self, notification: &AccountNotification) -> Option<OutgoingMail> {
        match compose(&self.renderer, notification, &self.product_tag) {
            Ok(mail) => Some(mail),
            Err(e) => {
                let event_type: &'static str = notification.event_type().into();
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::TEMPLATE,
                    error = %e,
                    notification.event_type = event_type,
                    "通知テンプレートのレンダリングに失敗"
                );
                None
            }
        }
    }

    /// 全チャネルに送信する
    async fn dispatch(&self, notification: &AccountNotification, mail: &OutgoingMail) {
        let event_type: &'static str = notification.event_type().into();

        for channel in notification.channels() {
            match channel {
                Channel::Mail => self.send_mail(mail, event_type).await,
            }
        }
    }

    async fn send_mail(&self, mail: &OutgoingMail, event_type: &'static str) {
        match self.sender.send_email(mail).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::NOTIFICATION,
                    event.result = event::result::SUCCESS,
                    notification.event_type = event_type,
                    notification.recipient = %mail.email.to,
                    notification.signed = mail.is_signed(),
                    "通知メール送信成功"
                );
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::NOTIFICATION,
                    event.result = event::result::FAILURE,
                    notification.event_type = event_type,
                    notification.recipient = %mail.email.to,
                    notification.signed = mail.is_signed(),
                    error = %e,
                    "通知メール送信失敗"
                );
            }
        }
    }
}
