//! Credential sets for the discovery backends
//!
//! The session backend's username and password live on disk as
//! `<value>:<rounds>` blobs, base64-encoded `rounds` times. That is
//! obfuscation, not protection; it sits behind [`Credentials`] so a real
//! secret store can replace it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Single API key
    Token(String),
    /// API id plus secret
    TokenPair { id: String, token: String },
    /// Cleartext login, exchanged for a session token
    Login { username: String, password: String },
    /// Login stored as obfuscated blobs, decoded on use
    ObfuscatedLogin { user_file: PathBuf, pass_file: PathBuf },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(<redacted>)"),
            Credentials::TokenPair { .. } => f.write_str("TokenPair(<redacted>)"),
            Credentials::Login { .. } => f.write_str("Login(<redacted>)"),
            Credentials::ObfuscatedLogin { user_file, pass_file } => f
                .debug_struct("ObfuscatedLogin")
                .field("user_file", user_file)
                .field("pass_file", pass_file)
                .finish(),
        }
    }
}

impl Credentials {
    /// Username and password for a login exchange.
    ///
    /// Obfuscated blobs that cannot be decoded yield empty strings; the remote
    /// login then fails and reports the problem.
    pub fn login_pair(&self) -> Option<(String, String)> {
        match self {
            Credentials::Login { username, password } => Some((username.clone(), password.clone())),
            Credentials::ObfuscatedLogin { user_file, pass_file } => {
                Some((read_obfuscated(user_file), read_obfuscated(pass_file)))
            }
            _ => None,
        }
    }
}

/// Decode a `<value>:<rounds>` blob. `None` on any malformation.
pub fn decode_blob(data: &str) -> Option<String> {
    let mut parts = data.split(':');
    let (encoded, rounds) = match (parts.next(), parts.next(), parts.next()) {
        (Some(encoded), Some(rounds), None) => (encoded, rounds),
        _ => return None,
    };
    let rounds: u32 = rounds.trim().parse().ok()?;

    let mut value = encoded.trim().to_string();
    for _ in 0..rounds {
        let bytes = STANDARD.decode(value.trim()).ok()?;
        value = String::from_utf8(bytes).ok()?;
    }
    Some(value.trim().to_string())
}

/// Read and decode one blob file, degrading to an empty credential
pub fn read_obfuscated(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(data) => decode_blob(&data).unwrap_or_else(|| {
            debug!("credential blob {} is malformed", path.display());
            String::new()
        }),
        Err(e) => {
            debug!("credential blob {} unreadable: {}", path.display(), e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_single_round() {
        assert_eq!(decode_blob("dGVzdA==:1").as_deref(), Some("test"));
    }

    #[test]
    fn test_multiple_rounds() {
        // "test" encoded twice
        assert_eq!(decode_blob("ZEdWemRBPT0=:2").as_deref(), Some("test"));
        assert_eq!(decode_blob("plain:0").as_deref(), Some("plain"));
    }

    #[test]
    fn test_malformed_blobs() {
        assert_eq!(decode_blob("dGVzdA=="), None);
        assert_eq!(decode_blob("dGVzdA==:x"), None);
        assert_eq!(decode_blob("a:1:2"), None);
        assert_eq!(decode_blob("!!!notbase64:1"), None);
        // valid base64, invalid utf-8
        assert_eq!(decode_blob("/w==:1"), None);
    }

    #[test]
    fn test_read_obfuscated_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "dGVzdA==:1").unwrap();
        assert_eq!(read_obfuscated(file.path()), "test");
        assert_eq!(read_obfuscated(Path::new("/nonexistent/users.lst")), "");
    }

    #[test]
    fn test_login_pair_degrades_to_empty() {
        let creds = Credentials::ObfuscatedLogin {
            user_file: PathBuf::from("/nonexistent/users.lst"),
            pass_file: PathBuf::from("/nonexistent/passes.lst"),
        };
        assert_eq!(creds.login_pair(), Some((String::new(), String::new())));
        assert_eq!(Credentials::Token("k".into()).login_pair(), None);
    }

    #[test]
    fn test_debug_never_shows_secrets() {
        let creds = Credentials::TokenPair {
            id: "my-id".into(),
            token: "my-secret".into(),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("my-id"));
        assert!(!rendered.contains("my-secret"));
    }
}
