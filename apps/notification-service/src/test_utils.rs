//! 通知テストビルダー
//!
//! モックを組み込んだ [`NotificationService`] と、検証用のモックのクローンをまとめて生成する。

use std::{path::PathBuf, sync::Arc};

use aliasrelay_domain::{
    recipient::{Fingerprint, Recipient, RecipientId, RecipientPreference},
    user::{Email, UserId},
};
use aliasrelay_infra::mock::{
    MockKeyExpiryAlert,
    MockNotificationSender,
    MockRecipientRepository,
    MockSignerFactory,
};

use crate::{
    config::SigningConfig,
    usecase::notification::{NotificationService, TemplateRenderer},
};

/// 組織の署名鍵（テスト用）
pub const ORG_SIGNING_KEY: &str = "ABCD0001";

/// 通知テストのセットアップデータ
pub struct NotificationTestSetup {
    pub sut:        Arc<NotificationService>,
    pub sender:     MockNotificationSender,
    pub recipients: MockRecipientRepository,
    pub factory:    MockSignerFactory,
    pub alert:      MockKeyExpiryAlert,
}

/// 通知テストビルダー
///
/// ```ignore
/// use aliasrelay_notification_service::test_utils::NotificationTestBuilder;
///
/// let builder = NotificationTestBuilder::new();
/// let recipient = builder.recipient(true, Some("ABC123"));
/// let setup = builder.with_recipient(recipient).build();
/// ```
pub struct NotificationTestBuilder {
    user_id:    UserId,
    sender:     MockNotificationSender,
    recipients: MockRecipientRepository,
    factory:    MockSignerFactory,
    signing:    SigningConfig,
}

impl NotificationTestBuilder {
    pub fn new() -> Self {
        Self {
            user_id:    UserId::new(),
            sender:     MockNotificationSender::new(),
            recipients: MockRecipientRepository::new(),
            factory:    MockSignerFactory::new(),
            signing:    SigningConfig {
                signing_key:  Some(Fingerprint::new(ORG_SIGNING_KEY).unwrap()),
                keyring_path: PathBuf::from("/tmp/aliasrelay-test-keyring"),
                gpg_binary:   PathBuf::from("gpg"),
            },
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// このビルダーのユーザーに紐づく受信者を作る
    pub fn recipient(&self, should_encrypt: bool, fingerprint: Option<&str>) -> Recipient {
        Recipient::new(
            RecipientId::new(),
            self.user_id.clone(),
            Email::new("new@example.com").unwrap(),
            RecipientPreference::new(
                should_encrypt,
                fingerprint.map(|f| Fingerprint::new(f).unwrap()),
            ),
        )
    }

    pub fn with_recipient(self, recipient: Recipient) -> Self {
        self.recipients.add_recipient(recipient);
        self
    }

    pub fn with_signer_factory(mut self, factory: MockSignerFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_sender(mut self, sender: MockNotificationSender) -> Self {
        self.sender = sender;
        self
    }

    pub fn build(self) -> NotificationTestSetup {
        let alert = MockKeyExpiryAlert::new();
        let sut = NotificationService::new(
            Arc::new(self.sender.clone()),
            Arc::new(TemplateRenderer::new().unwrap()),
            Arc::new(self.recipients.clone()),
            Arc::new(self.factory.clone()),
            Arc::new(alert.clone()),
            self.signing,
            "aliasrelay".to_string(),
        );

        NotificationTestSetup {
            sut: Arc::new(sut),
            sender: self.sender,
            recipients: self.recipients,
            factory: self.factory,
            alert,
        }
    }
}

impl Default for NotificationTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
