// slack/poster.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use tracing::{debug, warn};

use glados_common::models::OutboundMessage;
use glados_common::traits::MessagePoster;

use super::SLACK_API_BASE;
use crate::Error;

/// Posts through `chat.postMessage` as the bot user.
pub struct SlackPoster {
    token: String,
    api_base: String,
    http: ReqwestClient,
    trace_responses: bool,
}

impl SlackPoster {
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            token: token.into(),
            api_base: SLACK_API_BASE.to_string(),
            http,
            trace_responses: false,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Log every reply at debug level (used in debug mode).
    pub fn with_response_trace(mut self, enabled: bool) -> Self {
        self.trace_responses = enabled;
        self
    }

    fn form_fields(&self, message: &OutboundMessage) -> Result<Vec<(&'static str, String)>, Error> {
        let mut fields = vec![
            ("token", self.token.clone()),
            ("channel", message.channel.clone()),
            ("text", message.text.clone()),
            ("as_user", message.as_user.to_string()),
        ];
        if let Some(attachments) = &message.attachments {
            fields.push(("attachments", serde_json::to_string(attachments)?));
        }
        Ok(fields)
    }
}

fn check_reply(body: &Value) -> Result<(), Error> {
    if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(());
    }
    let code = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error");
    Err(Error::Platform(format!("chat.postMessage failed: {code}")))
}

#[async_trait]
impl MessagePoster for SlackPoster {
    async fn post_message(&self, message: &OutboundMessage) -> Result<(), Error> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let response = self
            .http
            .post(&url)
            .form(&self.form_fields(message)?)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if self.trace_responses {
            debug!("[Slack] chat.postMessage => {} {}", status, body);
        }
        check_reply(&body).inspect_err(|e| warn!("[Slack] {}", e))
    }
}
