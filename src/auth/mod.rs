//! Bearer credentials and the OAuth callback hand-off.
//!
//! Sign-in flow:
//!   1. open `{api}/auth/oauth/{provider}/start` in the browser
//!   2. the API redirects to `http://localhost:<port>/login/callback?token=…`
//!   3. `accept_callback` captures the token from that request
//!   4. the token is stored as the session until logout or a 401

use reqwest::Url;
use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Tokens shorter than this (after trimming) are treated as absent.
const MIN_TOKEN_LEN: usize = 10;

// ─── Credential ───────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }

    pub fn token(&self) -> &str { &self.0 }

    /// Accepts a token handed over by the OAuth redirect.
    pub fn from_callback(raw: &str) -> Result<Self, CallbackError> {
        let token = raw.trim();
        if token.chars().count() < MIN_TOKEN_LEN {
            return Err(CallbackError::TokenNotFound);
        }
        Ok(Self(token.to_owned()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }
}

// ─── Callback listener ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("token not found")]
    TokenNotFound,
    #[error("malformed callback request: {0:?}")]
    BadRequest(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub async fn bind_callback(port: u16) -> Result<TcpListener, CallbackError> {
    Ok(TcpListener::bind(("127.0.0.1", port)).await?)
}

/// Serves exactly one request on `listener` and returns the token it carried.
/// The browser gets a short page either way.
pub async fn accept_callback(listener: &TcpListener) -> Result<Credential, CallbackError> {
    let (mut stream, peer) = listener.accept().await?;
    tracing::debug!(%peer, "oauth callback connection");

    let mut line = String::new();
    BufReader::new(&mut stream).read_line(&mut line).await?;
    let result = token_from_request_line(&line);

    let page: &[u8] = match result {
        Ok(_) => b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
                  <html><body><h2>Signed in. You can close this tab.</h2></body></html>",
        Err(_) => b"HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
                   <html><body><h2>Login failed: token not found.</h2></body></html>",
    };
    stream.write_all(page).await?;
    stream.shutdown().await.ok();
    result
}

/// `GET /login/callback?token=XXX HTTP/1.1` → credential.
fn token_from_request_line(line: &str) -> Result<Credential, CallbackError> {
    let target = line.split_whitespace().nth(1)
        .ok_or_else(|| CallbackError::BadRequest(line.trim_end().to_owned()))?;
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(target))
        .map_err(|_| CallbackError::BadRequest(target.to_owned()))?;
    let token = url.query_pairs()
        .find_map(|(k, v)| (k == "token").then(|| v.into_owned()))
        .unwrap_or_default();
    Credential::from_callback(&token)
}
