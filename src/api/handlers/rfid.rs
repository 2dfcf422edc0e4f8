use axum::{extract::State, Json};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::{error::AppResult, models::LiveRfid, AppState};

use super::MessageResponse;

/// Pulls `uid` out of a scanner body. Firmware sends it as a string or a bare
/// number, with or without a JSON content type.
pub fn uid_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("uid")? {
        Value::String(uid) => Some(uid.clone()),
        Value::Number(uid) => Some(uid.to_string()),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateRfidResponse {
    pub message: String,
    pub uid: String,
    pub timestamp: DateTime<Utc>,
}

/// Public: the scanner pushes each tag read here.
pub async fn update_rfid(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<UpdateRfidResponse>> {
    let uid = uid_from_body(&body);
    let scan = state.rfid.publish(uid.as_deref()).await?;

    Ok(Json(UpdateRfidResponse {
        message: "RFID UID updated".to_string(),
        uid: scan.uid,
        timestamp: scan.captured_at,
    }))
}

pub async fn live_rfid(State(state): State<AppState>) -> AppResult<Json<LiveRfid>> {
    Ok(Json(state.rfid.read_live().await?))
}

pub async fn clear_rfid(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    state.rfid.clear().await?;
    Ok(Json(MessageResponse::new("RFID UID cleared")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_accepts_strings_and_numbers() {
        assert_eq!(uid_from_body(br#"{"uid":"04A1B2C3"}"#).as_deref(), Some("04A1B2C3"));
        assert_eq!(uid_from_body(br#"{"uid":12345}"#).as_deref(), Some("12345"));
    }

    #[test]
    fn other_shapes_carry_no_uid() {
        assert_eq!(uid_from_body(b""), None);
        assert_eq!(uid_from_body(b"uid=04A1"), None);
        assert_eq!(uid_from_body(br#"{"uid":null}"#), None);
        assert_eq!(uid_from_body(br#"{"uid":["04A1"]}"#), None);
        assert_eq!(uid_from_body(br#"["04A1"]"#), None);
    }
}
