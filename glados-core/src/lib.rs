// src/lib.rs

pub mod client;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod memory;
pub mod outbound;
pub mod platforms;
pub mod plugins;
pub mod session;
pub mod trigger_server;
pub mod test_utils;

pub use client::GladosClient;
pub use db::Database;
pub use glados_common::error::Error;
