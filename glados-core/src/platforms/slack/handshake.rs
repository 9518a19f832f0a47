use serde_json::Value;

use glados_common::models::RtmHandshake;

use crate::Error;

/// Turns an `rtm.start` reply into a handshake. `ok: false` replies carry
/// Slack's error code (`invalid_auth`, `not_authed`, ...) in `error`.
pub fn parse_rtm_start(body: Value) -> Result<RtmHandshake, Error> {
    if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        let code = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        return Err(Error::Platform(format!("rtm.start failed: {code}")));
    }
    if body.get("url").and_then(Value::as_str).is_none() {
        return Err(Error::Parse("rtm.start reply has no websocket url".into()));
    }
    Ok(serde_json::from_value(body)?)
}
