//! # Notification Service 設定
//!
//! 環境変数から Notification Service の設定を読み込む。
//!
//! 必須項目の欠落や不正な値は [`ConfigError`] として返す。起動処理（`main`）が
//! `anyhow` で受け取り、エラーメッセージを出して終了する。

use std::{
    env,
    path::{Path, PathBuf},
};

use aliasrelay_domain::recipient::Fingerprint;
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が設定されていない
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// ポート番号として解釈できない
    #[error("{name} は有効なポート番号である必要があります: {value:?}")]
    InvalidPort { name: &'static str, value: String },

    /// 署名鍵のフィンガープリントが不正
    #[error("SIGNING_KEY_FINGERPRINT が不正です: {0}")]
    InvalidFingerprint(String),

    /// 未知の通知バックエンド
    #[error("NOTIFICATION_BACKEND は smtp / ses / noop のいずれかである必要があります: {0:?}")]
    UnknownBackend(String),
}

/// Notification Service サーバーの設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// バインドアドレス
    pub host:         String,
    /// ポート番号
    pub port:         u16,
    /// データベース接続 URL
    pub database_url: String,
    /// 通知設定
    pub notification: NotificationConfig,
    /// 署名設定
    pub signing:      SigningConfig,
}

/// 通知の送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationBackend {
    /// Mailpit（開発）/ SMTP リレー経由で送信
    Smtp,
    /// Amazon SES v2 経由で送信（本番）
    Ses,
    /// 送信しない（ログ出力のみ）
    Noop,
}

impl NotificationBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "smtp" => Ok(Self::Smtp),
            "ses" => Ok(Self::Ses),
            "noop" => Ok(Self::Noop),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// 通知機能の設定
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// 送信バックエンド
    pub backend:      NotificationBackend,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:    String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:    u16,
    /// 送信元メールアドレス
    pub from_address: String,
    /// `Feedback-ID` ヘッダーのプロダクトタグ
    pub product_tag:  String,
}

/// 署名設定
///
/// 組織の署名鍵とキーリングの場所。署名鍵が未設定の場合、署名は常に失敗する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningConfig {
    /// 組織の署名鍵
    pub signing_key:  Option<Fingerprint>,
    /// キーリングのディレクトリ
    pub keyring_path: PathBuf,
    /// gpg バイナリのパス
    pub gpg_binary:   PathBuf,
}

impl SigningConfig {
    /// 署名鍵を持たない設定
    pub fn disabled() -> Self {
        Self {
            signing_key:  None,
            keyring_path: PathBuf::from(".gnupg"),
            gpg_binary:   PathBuf::from("gpg"),
        }
    }
}

impl NotifierConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host:         env::var("NOTIFIER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port:         parse_port("NOTIFIER_PORT", &required("NOTIFIER_PORT")?)?,
            database_url: required("DATABASE_URL")?,
            notification: NotificationConfig::from_env()?,
            signing:      SigningConfig::from_env()?,
        })
    }
}

impl NotificationConfig {
    /// 環境変数から通知設定を読み込む
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            backend:      NotificationBackend::parse(
                &env::var("NOTIFICATION_BACKEND").unwrap_or_else(|_| "noop".to_string()),
            )?,
            smtp_host:    env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port:    parse_port(
                "SMTP_PORT",
                &env::var("SMTP_PORT").unwrap_or_else(|_| "1025".to_string()),
            )?,
            from_address: env::var("NOTIFICATION_FROM_ADDRESS")
                .unwrap_or_else(|_| "noreply@aliasrelay.example.com".to_string()),
            product_tag:  env::var("NOTIFICATION_PRODUCT_TAG")
                .unwrap_or_else(|_| "aliasrelay".to_string()),
        })
    }
}

impl SigningConfig {
    /// 環境変数から署名設定を読み込む
    fn from_env() -> Result<Self, ConfigError> {
        let signing_key = env::var("SIGNING_KEY_FINGERPRINT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| Fingerprint::new(&v).map_err(|e| ConfigError::InvalidFingerprint(e.to_string())))
            .transpose()?;

        let keyring = env::var("GPG_KEYRING_PATH").unwrap_or_else(|_| "~/.gnupg".to_string());
        let home = env::var("HOME").ok();

        Ok(Self {
            signing_key,
            keyring_path: expand_home(&keyring, home.as_deref().map(Path::new)),
            gpg_binary: PathBuf::from(env::var("GPG_BINARY").unwrap_or_else(|_| "gpg".to_string())),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_port(name: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidPort {
        name,
        value: value.to_string(),
    })
}

/// 先頭の `~` をホームディレクトリに展開する
///
/// ホームディレクトリが不明な場合はそのまま返す。
fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home.to_path_buf(),
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("~/.gnupg", Some("/home/relay"), "/home/relay/.gnupg")]
    #[case("~", Some("/home/relay"), "/home/relay")]
    #[case("/var/lib/gnupg", Some("/home/relay"), "/var/lib/gnupg")]
    #[case("~/.gnupg", None, "~/.gnupg")]
    #[case("~other/.gnupg", Some("/home/relay"), "~other/.gnupg")]
    fn expand_homeはチルダをホームディレクトリに展開する(
        #[case] input: &str,
        #[case] home: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(
            expand_home(input, home.map(Path::new)),
            PathBuf::from(expected)
        );
    }

    #[rstest]
    #[case("smtp", NotificationBackend::Smtp)]
    #[case("ses", NotificationBackend::Ses)]
    #[case("noop", NotificationBackend::Noop)]
    fn バックエンド名をパースできる(#[case] input: &str, #[case] expected: NotificationBackend) {
        assert_eq!(NotificationBackend::parse(input), Ok(expected));
    }

    #[test]
    fn 未知のバックエンド名はエラーになる() {
        assert_eq!(
            NotificationBackend::parse("sendmail"),
            Err(ConfigError::UnknownBackend("sendmail".to_string()))
        );
    }

    #[rstest]
    #[case("3002", Ok(3002))]
    #[case("0", Ok(0))]
    #[case("70000", Err(()))]
    #[case("abc", Err(()))]
    fn ポート番号をパースできる(#[case] input: &str, #[case] expected: Result<u16, ()>) {
        assert_eq!(parse_port("NOTIFIER_PORT", input).map_err(|_| ()), expected);
    }
}
