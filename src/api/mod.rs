//! API module for HTTP and WebSocket endpoints
//!
//! This module provides the inbound email webhook and the WebSocket channel
//! that relays notifications to connected CRM clients.

pub mod http;
pub mod webhook;
pub mod websocket;
