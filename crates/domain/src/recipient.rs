//! # 受信者
//!
//! エイリアス宛のメールを転送する受信者と、その暗号化設定を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Recipient`] | 受信者 | 転送先メールボックス。デフォルト受信者はユーザーごとに 1 つ |
//! | [`RecipientPreference`] | 暗号化設定 | 送信メールを署名・暗号化するか、どの鍵を使うか |
//! | [`Fingerprint`] | 鍵フィンガープリント | 受信者の公開鍵の識別子 |
//!
//! ## 不変条件
//!
//! - フィンガープリントは `should_encrypt` が true の場合にのみ参照される
//! - 署名に失敗した受信者は `should_encrypt = false` に戻される（再有効化は利用者の操作のみ）

use serde::{Deserialize, Serialize};

use crate::{
    DomainError,
    user::{Email, UserId},
};

define_uuid_id! {
    /// 受信者 ID（一意識別子）
    pub struct RecipientId;
}

/// OpenPGP 鍵フィンガープリント（値オブジェクト）
///
/// 空白を除去し大文字に正規化する。16 進数字のみ、最大 64 文字。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// フィンガープリントの最大文字数（v5 鍵の 32 バイト = 64 桁）
    const MAX_LENGTH: usize = 64;

    /// フィンガープリントを作成する
    ///
    /// `gpg --fingerprint` の出力のように 4 桁ごとに空白が入った形式も受け付ける。
    pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let normalized: String = value
            .as_ref()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.is_empty() {
            return Err(DomainError::Validation(
                "フィンガープリントは必須です".to_string(),
            ));
        }

        if normalized.len() > Self::MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "フィンガープリントは {} 文字以内である必要があります",
                Self::MAX_LENGTH
            )));
        }

        if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::Validation(
                "フィンガープリントは16進数である必要があります".to_string(),
            ));
        }

        Ok(Self(normalized))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 受信者の暗号化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientPreference {
    should_encrypt: bool,
    fingerprint:    Option<Fingerprint>,
}

impl RecipientPreference {
    pub fn new(should_encrypt: bool, fingerprint: Option<Fingerprint>) -> Self {
        Self {
            should_encrypt,
            fingerprint,
        }
    }

    /// 暗号化しない設定
    pub fn plain() -> Self {
        Self::new(false, None)
    }

    pub fn should_encrypt(&self) -> bool {
        self.should_encrypt
    }

    /// 署名を試みるべきフィンガープリントを返す
    ///
    /// `should_encrypt` が true かつフィンガープリントが登録されている場合のみ `Some`。
    /// `should_encrypt` が false のときはフィンガープリントを参照しない。
    pub fn signing_fingerprint(&self) -> Option<&Fingerprint> {
        if !self.should_encrypt {
            return None;
        }
        self.fingerprint.as_ref()
    }

    /// 暗号化を無効にする（冪等）
    pub fn disable_encryption(&mut self) {
        self.should_encrypt = false;
    }
}

/// 受信者エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    id:         RecipientId,
    user_id:    UserId,
    email:      Email,
    preference: RecipientPreference,
}

impl Recipient {
    pub fn new(
        id: RecipientId,
        user_id: UserId,
        email: Email,
        preference: RecipientPreference,
    ) -> Self {
        Self {
            id,
            user_id,
            email,
            preference,
        }
    }

    pub fn id(&self) -> &RecipientId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn preference(&self) -> &RecipientPreference {
        &self.preference
    }

    /// 署名鍵が無効と判明した受信者の暗号化を停止した状態を返す
    ///
    /// 既に無効な場合も同じ状態を返す（冪等）。
    pub fn with_encryption_disabled(mut self) -> Self {
        self.preference.disable_encryption();
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn fingerprint(value: &str) -> Fingerprint {
        Fingerprint::new(value).unwrap()
    }

    #[rstest]
    #[case("ABC123", "ABC123")]
    #[case("abc123", "ABC123")]
    #[case("5A1B 22C4 90FF", "5A1B22C490FF")]
    fn test_フィンガープリントは正規化される(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(fingerprint(input).as_str(), expected);
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("   ", "空白のみ")]
    #[case("XYZ123", "16進数以外")]
    #[case(&"A".repeat(65), "64文字超過")]
    fn test_フィンガープリントは不正な値を拒否する(
        #[case] input: &str,
        #[case] _reason: &str,
    ) {
        assert!(Fingerprint::new(input).is_err());
    }

    #[rstest]
    #[case(true, Some("ABC123"), Some("ABC123"))]
    #[case(true, None, None)]
    #[case(false, Some("ABC123"), None)]
    #[case(false, None, None)]
    fn test_署名判定は暗号化有効かつ鍵登録済みの場合のみフィンガープリントを返す(
        #[case] should_encrypt: bool,
        #[case] registered: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let preference = RecipientPreference::new(should_encrypt, registered.map(fingerprint));

        assert_eq!(
            preference.signing_fingerprint().map(Fingerprint::as_str),
            expected
        );
    }

    #[test]
    fn test_暗号化の無効化は冪等() {
        let recipient = Recipient::new(
            RecipientId::new(),
            UserId::new(),
            Email::new("alias-owner@example.com").unwrap(),
            RecipientPreference::new(true, Some(fingerprint("ABC123"))),
        );

        let once = recipient.with_encryption_disabled();
        let twice = once.clone().with_encryption_disabled();

        assert!(!once.preference().should_encrypt());
        assert_eq!(once, twice);
        assert!(twice.preference().signing_fingerprint().is_none());
    }
}
