//! Meeting-provider API client.
//!
//! Account-credentials OAuth: every call fetches a short-lived access token
//! with the client id/secret, scoped to the configured account. Rooms are
//! created when a booking is confirmed and closed by the janitor once a
//! finished lesson's room stays empty.

use compact_str::CompactString;
use serde::Deserialize;
use time::OffsetDateTime;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum MeetingError {
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("meeting API rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Account-credentials grant material.
#[derive(Debug, Clone)]
pub struct MeetingCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub account_id: String,
}

/// A freshly created meeting room.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedMeeting {
    #[serde(deserialize_with = "id_as_string")]
    pub id: CompactString,
    pub join_url: String,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<CompactString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        String(CompactString),
    }
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => CompactString::from(n.to_string()),
        NumberOrString::String(s) => s,
    })
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ParticipantPage {
    total_records: i64,
}

#[derive(Clone)]
pub struct MeetingClient {
    api_base: Url,
    token_url: Url,
    credentials: MeetingCredentials,
    http_client: reqwest::Client,
}

impl MeetingClient {
    pub fn new(api_base: Url, token_url: Url, credentials: MeetingCredentials) -> Self {
        Self {
            api_base,
            token_url,
            credentials,
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    async fn access_token(&self) -> Result<String, MeetingError> {
        let response = self
            .http_client
            .post(self.token_url.clone())
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.credentials.account_id.as_str()),
            ])
            .send()
            .await?;
        let response = Self::checked(response).await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.api_base.clone();
        // Url::join would drop the base path for absolute-looking inputs.
        let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, MeetingError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MeetingError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Create a scheduled meeting room for a confirmed lesson.
    #[tracing::instrument(skip_all, err, fields(topic))]
    pub async fn create_meeting(
        &self,
        topic: &str,
        starts_at: OffsetDateTime,
        duration_minutes: i64,
    ) -> Result<CreatedMeeting, MeetingError> {
        let start_time = starts_at
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        let token = self.access_token().await?;
        let response = self
            .http_client
            .post(self.endpoint("users/me/meetings"))
            .bearer_auth(token)
            .json(&serde_json::json!({
                "topic": topic,
                "type": 2,
                "start_time": start_time,
                "duration": duration_minutes,
                "settings": {
                    "join_before_host": true,
                    "waiting_room": false,
                }
            }))
            .send()
            .await?;
        let response = Self::checked(response).await?;
        Ok(response.json().await?)
    }

    /// Number of participants currently in the room.
    #[tracing::instrument(skip_all, err, fields(meeting_id = %meeting_id))]
    pub async fn live_participant_count(
        &self,
        meeting_id: &CompactString,
    ) -> Result<i64, MeetingError> {
        let token = self.access_token().await?;
        let response = self
            .http_client
            .get(self.endpoint(&format!("metrics/meetings/{meeting_id}/participants")))
            .bearer_auth(token)
            .query(&[("type", "live")])
            .send()
            .await?;
        let response = Self::checked(response).await?;
        let page: ParticipantPage = response.json().await?;
        Ok(page.total_records)
    }

    /// End a running meeting.
    #[tracing::instrument(skip_all, err, fields(meeting_id = %meeting_id))]
    pub async fn end_meeting(&self, meeting_id: &CompactString) -> Result<(), MeetingError> {
        let token = self.access_token().await?;
        let response = self
            .http_client
            .put(self.endpoint(&format!("meetings/{meeting_id}/status")))
            .bearer_auth(token)
            .json(&serde_json::json!({ "action": "end" }))
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn client() -> MeetingClient {
        MeetingClient::new(
            Url::parse("https://api.example.com/v2").unwrap(),
            Url::parse("https://auth.example.com/oauth/token").unwrap(),
            MeetingCredentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
                account_id: "acct".into(),
            },
        )
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let url = client().endpoint("meetings/81234/status");
        assert_eq!(url.as_str(), "https://api.example.com/v2/meetings/81234/status");
    }

    #[test]
    fn created_meeting_accepts_numeric_id() {
        let created: CreatedMeeting = serde_json::from_str(
            r#"{"id": 81234567, "join_url": "https://meet.example.com/j/81234567"}"#,
        )
        .unwrap();
        assert_eq!(created.id, "81234567");
    }
}
