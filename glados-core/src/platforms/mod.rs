// File: src/platforms/mod.rs
//! Chat platform adapters. Each one implements `ChatTransport` for the
//! inbound stream and `MessagePoster` for outbound posts.

pub mod slack;
