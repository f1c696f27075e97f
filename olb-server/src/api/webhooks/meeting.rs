//! Meeting-provider webhook.
//!
//! Handles the URL-validation challenge and participant join/leave events.
//! Occupancy changes are forwarded to the janitor as events; the webhook
//! itself never talks to the meeting API beyond a live head-count, so the
//! provider always gets a quick acknowledgment.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use olb_core::events::types::MeetingRoomEvent;
use olb_sdk::objects::{MeetingChallengeResponse, MeetingEvent};
use olb_sdk::signature;

use crate::state::AppState;

/// `POST /api/webhooks/meeting`.
pub async fn handle(State(state): State<AppState>, Json(event): Json<MeetingEvent>) -> Response {
    match event.event.as_str() {
        "endpoint.url_validation" => {
            let Some(plain_token) = event.payload.plain_token else {
                return (StatusCode::BAD_REQUEST, "missing plain_token").into_response();
            };
            let meetings = state.config.meetings.read().await;
            let encrypted_token =
                signature::challenge_digest(&plain_token, meetings.webhook_secret());
            drop(meetings);
            Json(MeetingChallengeResponse {
                plain_token,
                encrypted_token,
            })
            .into_response()
        }
        "meeting.participant_left" => {
            let Some(object) = event.payload.object else {
                return (StatusCode::BAD_REQUEST, "missing meeting object").into_response();
            };
            // The leave event may race a concurrent join; ask the provider
            // for the live head-count before declaring the room empty.
            let room_event = match state.meeting_client.live_participant_count(&object.id).await {
                Ok(0) => MeetingRoomEvent::Emptied {
                    meeting_id: object.id,
                },
                Ok(_) => MeetingRoomEvent::Occupied {
                    meeting_id: object.id,
                },
                Err(e) => {
                    tracing::warn!(error = %e, meeting_id = %object.id, "Failed to query live participants");
                    return StatusCode::OK.into_response();
                }
            };
            dispatch(&state, room_event).await
        }
        "meeting.participant_joined" => {
            let Some(object) = event.payload.object else {
                return (StatusCode::BAD_REQUEST, "missing meeting object").into_response();
            };
            dispatch(
                &state,
                MeetingRoomEvent::Occupied {
                    meeting_id: object.id,
                },
            )
            .await
        }
        other => {
            tracing::debug!(event = other, "Ignoring meeting event");
            StatusCode::OK.into_response()
        }
    }
}

async fn dispatch(state: &AppState, event: MeetingRoomEvent) -> Response {
    if let Err(e) = state.events.meeting_room.send(event).await {
        tracing::error!(error = %e, "Failed to queue meeting-room event");
    }
    StatusCode::OK.into_response()
}
