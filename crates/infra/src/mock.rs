//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! aliasrelay-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! どのモックも `Clone` で内部状態（`Arc<Mutex<_>>`）を共有する。
//! テスト側でクローンを保持しておけば、サービスに渡した後でも呼び出し履歴を検証できる。

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use aliasrelay_domain::{
    notification::{NotificationError, SigningError},
    recipient::{Fingerprint, Recipient, RecipientId},
    user::{Email, UserId},
};
use async_trait::async_trait;

use crate::{
    error::InfraError,
    notification::{KeyExpiryAlert, NotificationSender, OutgoingMail},
    repository::RecipientRepository,
    signing::{MailSigner, SignerFactory},
};

fn fingerprint(value: &str) -> Fingerprint {
    Fingerprint::new(value).unwrap()
}

// ===== MockRecipientRepository =====

/// 受信者のインメモリストア
///
/// ユーザーごとのデフォルト受信者は、そのユーザーに紐づく最初の受信者とみなす。
#[derive(Clone, Default)]
pub struct MockRecipientRepository {
    recipients:    Arc<Mutex<Vec<Recipient>>>,
    disable_calls: Arc<Mutex<usize>>,
    fail_lookup:   bool,
}

impl MockRecipientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 受信者を 1 件登録した状態で作成する
    pub fn with_recipient(recipient: Recipient) -> Self {
        let repo = Self::new();
        repo.add_recipient(recipient);
        repo
    }

    /// 取得が常にデータベースエラーになるストア
    pub fn failing_lookup() -> Self {
        Self {
            fail_lookup: true,
            ..Self::default()
        }
    }

    pub fn add_recipient(&self, recipient: Recipient) {
        self.recipients.lock().unwrap().push(recipient);
    }

    /// 現在の受信者の状態
    pub fn recipient(&self, id: &RecipientId) -> Option<Recipient> {
        self.recipients
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    /// `disable_encryption` の呼び出し回数
    pub fn disable_count(&self) -> usize {
        *self.disable_calls.lock().unwrap()
    }
}

#[async_trait]
impl RecipientRepository for MockRecipientRepository {
    async fn find_default_by_user(&self, user_id: &UserId) -> Result<Option<Recipient>, InfraError> {
        if self.fail_lookup {
            return Err(InfraError::unexpected("モック: 受信者の取得に失敗"));
        }

        Ok(self
            .recipients
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id() == user_id)
            .cloned())
    }

    async fn disable_encryption(&self, recipient_id: &RecipientId) -> Result<(), InfraError> {
        *self.disable_calls.lock().unwrap() += 1;

        let mut recipients = self.recipients.lock().unwrap();
        if let Some(index) = recipients.iter().position(|r| r.id() == recipient_id) {
            let updated = recipients.remove(index).with_encryption_disabled();
            recipients.insert(index, updated);
        }
        Ok(())
    }
}

// ===== MockMailSigner =====

/// 署名ハンドルのモック
///
/// `seal` は平文を含まない固定の ASCII armor を返す。
#[derive(Debug, Clone)]
pub struct MockMailSigner {
    signing_key:       Fingerprint,
    recipients:        Vec<Fingerprint>,
    add_recipient_err: Option<SigningError>,
    fail_seal:         bool,
    sealed:            Arc<Mutex<usize>>,
}

impl MockMailSigner {
    pub fn new(signing_key: &str, recipients: &[&str]) -> Self {
        Self {
            signing_key:       fingerprint(signing_key),
            recipients:        recipients.iter().copied().map(fingerprint).collect(),
            add_recipient_err: None,
            fail_seal:         false,
            sealed:            Arc::new(Mutex::new(0)),
        }
    }

    /// `seal` が常に失敗する署名ハンドル
    pub fn failing_seal(signing_key: &str) -> Self {
        Self {
            fail_seal: true,
            ..Self::new(signing_key, &[])
        }
    }

    /// `seal` の呼び出し回数
    pub fn sealed_count(&self) -> usize {
        *self.sealed.lock().unwrap()
    }
}

#[async_trait]
impl MailSigner for MockMailSigner {
    fn signing_key(&self) -> &Fingerprint {
        &self.signing_key
    }

    fn recipients(&self) -> &[Fingerprint] {
        &self.recipients
    }

    async fn add_recipient(&mut self, fingerprint: &Fingerprint) -> Result<(), SigningError> {
        if let Some(err) = &self.add_recipient_err {
            return Err(err.clone());
        }
        self.recipients.push(fingerprint.clone());
        Ok(())
    }

    async fn seal(&self, _plaintext: &[u8]) -> Result<Vec<u8>, SigningError> {
        if self.fail_seal {
            return Err(SigningError::SealFailed("モック: 封緘に失敗".to_string()));
        }
        *self.sealed.lock().unwrap() += 1;
        Ok(b"-----BEGIN PGP MESSAGE-----\r\n\r\nbW9jaw==\r\n-----END PGP MESSAGE-----\r\n".to_vec())
    }
}

// ===== MockSignerFactory =====

/// 署名ツールキットのモック
#[derive(Clone, Default)]
pub struct MockSignerFactory {
    new_signer_err:    Option<SigningError>,
    add_recipient_err: Option<SigningError>,
    fail_seal:         bool,
    calls:             Arc<Mutex<Vec<Fingerprint>>>,
}

impl MockSignerFactory {
    /// 常に署名ハンドルを生成できるツールキット
    pub fn new() -> Self {
        Self::default()
    }

    /// 署名ハンドルの生成（組織鍵の確認）で失敗するツールキット
    pub fn failing(err: SigningError) -> Self {
        Self {
            new_signer_err: Some(err),
            ..Self::default()
        }
    }

    /// 受信者鍵の登録で失敗するツールキット
    pub fn failing_on_recipient(err: SigningError) -> Self {
        Self {
            add_recipient_err: Some(err),
            ..Self::default()
        }
    }

    /// 鍵の確認には成功するが、`seal` で失敗する署名ハンドルを返すツールキット
    ///
    /// パスフレーズ付きの組織鍵や、確認と封緘の間に鍵が期限切れになった場合に相当する。
    pub fn failing_on_seal() -> Self {
        Self {
            fail_seal: true,
            ..Self::default()
        }
    }

    /// `new_signer` の呼び出し回数
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `new_signer` に渡された組織鍵
    pub fn requested_keys(&self) -> Vec<Fingerprint> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignerFactory for MockSignerFactory {
    async fn new_signer(
        &self,
        signing_key: &Fingerprint,
        _keyring: &Path,
    ) -> Result<Box<dyn MailSigner>, SigningError> {
        self.calls.lock().unwrap().push(signing_key.clone());

        if let Some(err) = &self.new_signer_err {
            return Err(err.clone());
        }

        let mut signer = MockMailSigner::new(signing_key.as_str(), &[]);
        signer.add_recipient_err = self.add_recipient_err.clone();
        signer.fail_seal = self.fail_seal;
        Ok(Box::new(signer))
    }
}

// ===== MockNotificationSender =====

/// メール送信のモック
///
/// 送信されたメールを記録する。`failing()` で常に送信失敗にできる。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    fail: bool,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// 送信に成功したメール
    pub fn sent_mails(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, mail: &OutgoingMail) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::SendFailed(
                "モック: 送信に失敗".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

// ===== MockKeyExpiryAlert =====

/// 期限切れアラートのモック
#[derive(Clone, Default)]
pub struct MockKeyExpiryAlert {
    alerts: Arc<Mutex<Vec<Email>>>,
}

impl MockKeyExpiryAlert {
    pub fn new() -> Self {
        Self::default()
    }

    /// アラートを送った宛先
    pub fn alerted(&self) -> Vec<Email> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyExpiryAlert for MockKeyExpiryAlert {
    async fn alert_key_expired(&self, recipient_email: &Email) -> Result<(), NotificationError> {
        self.alerts.lock().unwrap().push(recipient_email.clone());
        Ok(())
    }
}
