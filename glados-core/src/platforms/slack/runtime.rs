// slack/runtime.rs

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use glados_common::models::{ConnectionStatus, InboundEvent, RtmHandshake};
use glados_common::traits::ChatTransport;

use super::handshake::parse_rtm_start;
use super::SLACK_API_BASE;
use crate::Error;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Slack's Real Time Messaging socket. `connect` calls `rtm.start`, opens the
/// returned websocket and spawns a reader that decodes frames into events.
pub struct SlackRtmTransport {
    token: String,
    api_base: String,
    http: ReqwestClient,
    connection_status: ConnectionStatus,

    incoming: Option<UnboundedReceiver<InboundEvent>>,
    write_half: Option<WsSink>,
    read_task: Option<JoinHandle<()>>,
}

impl SlackRtmTransport {
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            token: token.into(),
            api_base: SLACK_API_BASE.to_string(),
            http,
            connection_status: ConnectionStatus::Disconnected,
            incoming: None,
            write_half: None,
            read_task: None,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn rtm_start(&self) -> Result<RtmHandshake, Error> {
        let url = format!("{}/rtm.start", self.api_base);
        let body: Value = self
            .http
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await?
            .json()
            .await?;
        parse_rtm_start(body)
    }
}

#[async_trait]
impl ChatTransport for SlackRtmTransport {
    async fn connect(&mut self) -> Result<RtmHandshake, Error> {
        let handshake = match self.rtm_start().await {
            Ok(hs) => hs,
            Err(e) => {
                self.connection_status = ConnectionStatus::Error(e.to_string());
                return Err(e);
            }
        };

        let (ws_stream, _response) = connect_async(handshake.url.as_str()).await.map_err(|e| {
            let err = Error::WebSocket(format!("Slack RTM connect failed: {e}"));
            self.connection_status = ConnectionStatus::Error(err.to_string());
            err
        })?;
        info!("[Slack] RTM socket connected.");

        let (write_half, mut read_half) = ws_stream.split();
        let (tx_evt, rx_evt) = mpsc::unbounded_channel::<InboundEvent>();

        let handle = tokio::spawn(async move {
            while let Some(frame) = read_half.next().await {
                match frame {
                    Ok(Message::Text(txt)) => match InboundEvent::from_json(&txt) {
                        Ok(evt) => {
                            if tx_evt.send(evt).is_err() {
                                break;
                            }
                        }
                        Err(e) => debug!("[Slack] undecodable frame ({}): {}", e, txt.as_str()),
                    },
                    Ok(Message::Close(frame)) => {
                        info!("[Slack] RTM socket closed by server: {:?}", frame);
                        break;
                    }
                    Ok(other) => trace!("[Slack] ignoring frame: {:?}", other),
                    Err(e) => {
                        warn!("[Slack] websocket error => {}", e);
                        break;
                    }
                }
            }
            debug!("[Slack] RTM read task ended.");
        });

        self.incoming = Some(rx_evt);
        self.write_half = Some(write_half);
        self.read_task = Some(handle);
        self.connection_status = ConnectionStatus::Connected;
        Ok(handshake)
    }

    async fn next_event(&mut self) -> Option<InboundEvent> {
        let rx = self.incoming.as_mut()?;
        let evt = rx.recv().await;
        if evt.is_none() {
            self.connection_status = ConnectionStatus::Disconnected;
        }
        evt
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        if let Some(mut sink) = self.write_half.take() {
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!("[Slack] close frame not sent: {}", e);
            }
        }
        if let Some(handle) = self.read_task.take() {
            handle.abort();
        }
        self.incoming = None;
        self.connection_status = ConnectionStatus::Disconnected;
        info!("[Slack] disconnected.");
        Ok(())
    }

    fn connection_status(&self) -> ConnectionStatus {
        self.connection_status.clone()
    }
}
