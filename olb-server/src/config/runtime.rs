//! Validated runtime configuration.
//!
//! Secrets are kept as byte boxes ready for the HMAC operations; each
//! section sits behind its own lock so a SIGHUP reload never blocks
//! unrelated readers.

use olb_core::meetings::MeetingCredentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    session_secret: Box<[u8]>,
}

impl AuthConfig {
    pub fn new(session_secret: String) -> Self {
        Self {
            session_secret: session_secret.into_bytes().into_boxed_slice(),
        }
    }

    pub fn session_secret(&self) -> &[u8] {
        &self.session_secret
    }
}

#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    webhook_secret: Box<[u8]>,
}

impl PaymentsConfig {
    pub fn new(webhook_secret: String) -> Self {
        Self {
            webhook_secret: webhook_secret.into_bytes().into_boxed_slice(),
        }
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.webhook_secret
    }
}

#[derive(Debug, Clone)]
pub struct MeetingsConfig {
    webhook_secret: Box<[u8]>,
    pub credentials: MeetingCredentials,
    pub api_base: Url,
    pub token_url: Url,
}

impl MeetingsConfig {
    pub fn new(
        webhook_secret: String,
        credentials: MeetingCredentials,
        api_base: Url,
        token_url: Url,
    ) -> Self {
        Self {
            webhook_secret: webhook_secret.into_bytes().into_boxed_slice(),
            credentials,
            api_base,
            token_url,
        }
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.webhook_secret
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub endpoint: Url,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct LinksConfig {
    share_secret: Box<[u8]>,
    pub share_base_url: Url,
}

impl LinksConfig {
    pub fn new(share_secret: String, share_base_url: Url) -> Self {
        Self {
            share_secret: share_secret.into_bytes().into_boxed_slice(),
            share_base_url,
        }
    }

    pub fn share_secret(&self) -> &[u8] {
        &self.share_secret
    }
}

/// Shared configuration state with separate locks for each section.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub auth: Arc<RwLock<AuthConfig>>,
    pub payments: Arc<RwLock<PaymentsConfig>>,
    pub meetings: Arc<RwLock<MeetingsConfig>>,
    pub mail: Arc<RwLock<MailConfig>>,
    pub links: Arc<RwLock<LinksConfig>>,
}
