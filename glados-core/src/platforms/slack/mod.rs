// File: src/platforms/slack/mod.rs

pub mod handshake;
pub mod poster;
pub mod runtime;

pub use handshake::parse_rtm_start;
pub use poster::SlackPoster;
pub use runtime::SlackRtmTransport;

pub const SLACK_API_BASE: &str = "https://slack.com/api";
