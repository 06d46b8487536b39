//! Test Helper Utilities
//!
//! Shared utilities for testing safeapp-dash

#![allow(dead_code)]

pub mod fake_remote;
pub mod webhook_server;

pub use fake_remote::{FakeMicrophone, FakeRemote, RemoteCall};
pub use webhook_server::{spawn_webhook_server, RecordedRequest, WebhookServer};
