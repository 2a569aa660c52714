//! gpg 署名ツールキット実装
//!
//! システムの `gpg` バイナリを `--homedir` 指定で呼び出す。
//! 鍵の状態は `--with-colons` 出力の validity / capability フィールドで判定する。

use std::{
    path::{Path, PathBuf},
    process::{Output, Stdio},
};

use aliasrelay_domain::{notification::SigningError, recipient::Fingerprint};
use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};

use super::{MailSigner, SignerFactory};

/// gpg 署名ハンドルの生成
#[derive(Debug, Clone)]
pub struct GpgSignerFactory {
    gpg_path: PathBuf,
}

impl GpgSignerFactory {
    /// PATH 上の `gpg` を使用する
    pub fn new() -> Self {
        Self::with_path(PathBuf::from("gpg"))
    }

    /// gpg バイナリのパスを指定する
    pub fn with_path(gpg_path: PathBuf) -> Self {
        Self { gpg_path }
    }
}

impl Default for GpgSignerFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignerFactory for GpgSignerFactory {
    #[tracing::instrument(skip_all, level = "debug", fields(%signing_key))]
    async fn new_signer(
        &self,
        signing_key: &Fingerprint,
        keyring: &Path,
    ) -> Result<Box<dyn MailSigner>, SigningError> {
        let gpg = GpgCommand {
            gpg_path: self.gpg_path.clone(),
            homedir:  keyring.to_path_buf(),
        };

        let output = gpg
            .run(
                &[
                    "--batch",
                    "--with-colons",
                    "--list-secret-keys",
                    signing_key.as_str(),
                ],
                None,
            )
            .await?;

        ensure_usable(&output, "sec", 'S', signing_key)?;

        Ok(Box::new(GpgSigner {
            gpg,
            signing_key: signing_key.clone(),
            recipients: Vec::new(),
        }))
    }
}

/// gpg 署名ハンドル
#[derive(Debug)]
pub struct GpgSigner {
    gpg:         GpgCommand,
    signing_key: Fingerprint,
    recipients:  Vec<Fingerprint>,
}

#[async_trait]
impl MailSigner for GpgSigner {
    fn signing_key(&self) -> &Fingerprint {
        &self.signing_key
    }

    fn recipients(&self) -> &[Fingerprint] {
        &self.recipients
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%fingerprint))]
    async fn add_recipient(&mut self, fingerprint: &Fingerprint) -> Result<(), SigningError> {
        let output = self
            .gpg
            .run(
                &["--batch", "--with-colons", "--list-keys", fingerprint.as_str()],
                None,
            )
            .await?;

        ensure_usable(&output, "pub", 'E', fingerprint)?;

        if !self.recipients.contains(fingerprint) {
            self.recipients.push(fingerprint.clone());
        }
        Ok(())
    }

    async fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, SigningError> {
        if self.recipients.is_empty() {
            return Err(SigningError::SealFailed(
                "暗号化の宛先が登録されていません".to_string(),
            ));
        }

        let mut args = vec![
            "--batch",
            "--yes",
            "--armor",
            "--trust-model",
            "always",
            "--local-user",
            self.signing_key.as_str(),
            "--sign",
            "--encrypt",
        ];
        for recipient in &self.recipients {
            args.push("--recipient");
            args.push(recipient.as_str());
        }

        let output = self.gpg.run(&args, Some(plaintext)).await?;
        if !output.status.success() {
            return Err(SigningError::SealFailed(stderr_of(&output)));
        }

        Ok(output.stdout)
    }
}

/// `--homedir` を固定した gpg 呼び出し
#[derive(Debug, Clone)]
struct GpgCommand {
    gpg_path: PathBuf,
    homedir:  PathBuf,
}

impl GpgCommand {
    /// gpg を実行し、終了ステータスを含む出力を返す
    ///
    /// プロセスを起動できない場合のみ `ToolkitUnavailable` を返す。
    /// 終了ステータスの解釈は呼び出し側に任せる。
    async fn run(&self, args: &[&str], stdin_data: Option<&[u8]>) -> Result<Output, SigningError> {
        let mut cmd = Command::new(&self.gpg_path);
        cmd.arg("--homedir")
            .arg(&self.homedir)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            SigningError::ToolkitUnavailable(format!(
                "{} を起動できません: {e}",
                self.gpg_path.display()
            ))
        })?;

        let Some(data) = stdin_data else {
            return child
                .wait_with_output()
                .await
                .map_err(|e| SigningError::ToolkitUnavailable(format!("gpg の実行に失敗: {e}")));
        };

        let stdin = child.stdin.take();
        // stdout を読みながら書き込まないと、大きな本文でパイプが詰まる
        let write = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(data).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());

        written.map_err(|e| SigningError::SealFailed(format!("gpg への書き込みに失敗: {e}")))?;
        output.map_err(|e| SigningError::ToolkitUnavailable(format!("gpg の実行に失敗: {e}")))
    }
}

/// 鍵の有効性（`--with-colons` の第 2 フィールド）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyValidity {
    Usable,
    Expired,
    Revoked,
    Disabled,
    Invalid,
}

impl KeyValidity {
    fn from_flag(flag: &str) -> Self {
        match flag {
            "e" => Self::Expired,
            "r" => Self::Revoked,
            "d" => Self::Disabled,
            "i" | "n" => Self::Invalid,
            _ => Self::Usable,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Usable => "有効",
            Self::Expired => "有効期限切れ",
            Self::Revoked => "失効済み",
            Self::Disabled => "無効化済み",
            Self::Invalid => "不正な鍵",
        }
    }
}

/// 主鍵レコードの要約
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyListing {
    validity:     KeyValidity,
    /// 鍵全体の利用可能な機能（大文字: S=署名, E=暗号化, C=認証）
    capabilities: String,
}

/// `--with-colons` 出力から最初の主鍵レコードを読み取る
///
/// `record_type` は秘密鍵なら `sec`、公開鍵なら `pub`。
fn parse_primary_key(colons: &str, record_type: &str) -> Option<KeyListing> {
    colons.lines().find_map(|line| {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.first() != Some(&record_type) {
            return None;
        }
        Some(KeyListing {
            validity:     KeyValidity::from_flag(fields.get(1).copied().unwrap_or_default()),
            capabilities: fields.get(11).copied().unwrap_or_default().to_string(),
        })
    })
}

/// 鍵一覧の出力から、鍵が存在し指定の機能で使用可能であることを確認する
fn ensure_usable(
    output: &Output,
    record_type: &str,
    capability: char,
    fingerprint: &Fingerprint,
) -> Result<(), SigningError> {
    if !output.status.success() {
        tracing::debug!(stderr = %stderr_of(output), "gpg が鍵を見つけられませんでした");
        return Err(SigningError::KeyNotFound {
            fingerprint: fingerprint.clone(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let Some(listing) = parse_primary_key(&stdout, record_type) else {
        return Err(SigningError::KeyNotFound {
            fingerprint: fingerprint.clone(),
        });
    };

    if listing.validity != KeyValidity::Usable {
        return Err(SigningError::KeyUnusable {
            fingerprint: fingerprint.clone(),
            reason:      listing.validity.describe().to_string(),
        });
    }

    // 機能フィールドが空の古い gpg 出力は判定できないため許容する
    if !listing.capabilities.is_empty() && !listing.capabilities.contains(capability) {
        return Err(SigningError::KeyUnusable {
            fingerprint: fingerprint.clone(),
            reason:      format!("機能 {capability} を持たない鍵"),
        });
    }

    Ok(())
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const PUB_LISTING: &str = "\
tru::1:1700000000:0:3:1:5
pub:u:4096:1:1234567890ABCDEF:1600000000:::u:::scESC::::::23::0:
fpr:::::::::ABC1231234567890ABCDEF1234567890ABCDEF:
uid:u::::1600000000::HASH::Alias Owner <owner@example.com>::::::::::0:
sub:u:4096:1:FEDCBA0987654321:1600000000::::::e::::::23:
";

    fn fingerprint() -> Fingerprint {
        Fingerprint::new("ABC123").unwrap()
    }

    #[test]
    fn 主鍵レコードの有効性と機能を読み取る() {
        let listing = parse_primary_key(PUB_LISTING, "pub").unwrap();

        assert_eq!(listing.validity, KeyValidity::Usable);
        assert_eq!(listing.capabilities, "scESC");
    }

    #[test]
    fn 該当レコードがなければnoneを返す() {
        assert_eq!(parse_primary_key(PUB_LISTING, "sec"), None);
        assert_eq!(parse_primary_key("", "pub"), None);
    }

    #[rstest]
    #[case("e", KeyValidity::Expired)]
    #[case("r", KeyValidity::Revoked)]
    #[case("d", KeyValidity::Disabled)]
    #[case("i", KeyValidity::Invalid)]
    #[case("n", KeyValidity::Invalid)]
    #[case("u", KeyValidity::Usable)]
    #[case("f", KeyValidity::Usable)]
    #[case("-", KeyValidity::Usable)]
    fn validityフラグを解釈する(#[case] flag: &str, #[case] expected: KeyValidity) {
        assert_eq!(KeyValidity::from_flag(flag), expected);
    }

    #[cfg(unix)]
    fn output_with(stdout: &str, exit_code: i32) -> Output {
        use std::os::unix::process::ExitStatusExt;

        Output {
            status: std::process::ExitStatus::from_raw(exit_code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn 有効期限切れの鍵はkey_unusableになる() {
        let expired = PUB_LISTING.replace("pub:u:", "pub:e:");

        let result = ensure_usable(&output_with(&expired, 0), "pub", 'E', &fingerprint());

        assert_eq!(
            result,
            Err(SigningError::KeyUnusable {
                fingerprint: fingerprint(),
                reason:      "有効期限切れ".to_string(),
            })
        );
    }

    #[cfg(unix)]
    #[test]
    fn gpgが失敗終了した場合はkey_not_foundになる() {
        let result = ensure_usable(&output_with("", 2), "pub", 'E', &fingerprint());

        assert_eq!(
            result,
            Err(SigningError::KeyNotFound {
                fingerprint: fingerprint(),
            })
        );
    }

    #[cfg(unix)]
    #[test]
    fn 暗号化機能のない鍵はkey_unusableになる() {
        let sign_only = PUB_LISTING.replace(":scESC:", ":scSC:");

        let result = ensure_usable(&output_with(&sign_only, 0), "pub", 'E', &fingerprint());

        assert!(matches!(result, Err(SigningError::KeyUnusable { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn 有効な鍵は受け入れる() {
        assert_eq!(
            ensure_usable(&output_with(PUB_LISTING, 0), "pub", 'E', &fingerprint()),
            Ok(())
        );
    }

    #[tokio::test]
    async fn gpgバイナリがなければtoolkit_unavailableになる() {
        let factory = GpgSignerFactory::with_path(PathBuf::from("/nonexistent/gpg-binary"));

        let result = factory
            .new_signer(&fingerprint(), Path::new("/tmp/aliasrelay-keyring"))
            .await;

        assert!(matches!(result, Err(SigningError::ToolkitUnavailable(_))));
    }

    #[tokio::test]
    async fn 宛先未登録のsealはseal_failedになる() {
        let signer = GpgSigner {
            gpg:         GpgCommand {
                gpg_path: PathBuf::from("gpg"),
                homedir:  PathBuf::from("/tmp/aliasrelay-keyring"),
            },
            signing_key: fingerprint(),
            recipients:  Vec::new(),
        };

        assert!(matches!(
            signer.seal(b"body").await,
            Err(SigningError::SealFailed(_))
        ));
    }
}
