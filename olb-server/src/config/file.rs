//! TOML file configuration structures.
//!
//! These structs directly map to the `olb-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerSection,
    pub auth: AuthSection,
    pub payments: PaymentsSection,
    pub meetings: MeetingsSection,
    pub mail: MailSection,
    pub links: LinksSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Access-token authentication section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSection {
    /// Key for signing teacher access tokens.
    pub session_secret: String,
}

/// Payment-provider section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsSection {
    /// Key the provider signs webhook bodies with.
    pub webhook_secret: String,
}

/// Meeting-provider section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingsSection {
    /// Key for answering endpoint-validation challenges.
    pub webhook_secret: String,
    pub client_id: String,
    pub client_secret: String,
    pub account_id: String,
    #[serde(default = "default_meeting_api_base")]
    pub api_base: Url,
    #[serde(default = "default_meeting_token_url")]
    pub token_url: Url,
}

fn default_meeting_api_base() -> Url {
    Url::parse("https://api.zoom.us/v2").unwrap_or_else(|_| unreachable!())
}

fn default_meeting_token_url() -> Url {
    Url::parse("https://zoom.us/oauth/token").unwrap_or_else(|_| unreachable!())
}

/// Transactional mail API section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSection {
    pub endpoint: Url,
    pub api_key: String,
    /// Sender address, e.g. `"Lessons <no-reply@example.com>"`.
    pub from: String,
}

/// Share-link section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksSection {
    /// Key for signing special-slot share tokens.
    pub share_secret: String,
    /// Frontend base the share links point into.
    pub share_base_url: Url,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[auth]
session_secret = "session-key"

[payments]
webhook_secret = "payment-key"

[meetings]
webhook_secret = "meeting-key"
client_id = "client"
client_secret = "secret"
account_id = "account"

[mail]
endpoint = "https://mail.example.com/v1/send"
api_key = "mail-key"
from = "Lessons <no-reply@example.com>"

[links]
share_secret = "link-key"
share_base_url = "https://app.example.com"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.meetings.api_base.as_str(), "https://api.zoom.us/v2");
        assert_eq!(config.links.share_base_url.as_str(), "https://app.example.com/");
    }

    #[test]
    fn listen_defaults_when_omitted() {
        let section: ServerSection = toml::from_str("").unwrap();
        assert_eq!(section.listen.port(), 8080);
    }
}
