// src/transport/mod.rs - Transport Layer
//! Seams to the outside world
//!
//! - [`Transport`]: the FIX engine that owns sessions and puts messages on the
//!   wire. This crate only hands it finished application messages.
//! - [`rest`]: HTTP/JSON front end over [`TradeClient`](crate::TradeClient).

pub mod rest;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{core::types::SessionId, fix::message::WireMessage, OmsError, OmsResult};

/// Outbound half of the FIX session engine
#[async_trait]
pub trait Transport: Send + Sync {
    /// Queue `message` on `session`
    ///
    /// An error means the message was not accepted and nothing went out.
    async fn send(&self, message: WireMessage, session: &SessionId) -> OmsResult<()>;
}

/// A message handed to [`ChannelTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Session it was sent on
    pub session: SessionId,
    /// The message itself
    pub message: WireMessage,
}

/// Transport that forwards every message to an in-process channel
///
/// Whoever holds the receiver plays the part of the session engine: it can
/// log the traffic, forward it to a real FIX connection, or assert on it in
/// tests.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelTransport {
    /// Transport plus the receiver its messages arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, message: WireMessage, session: &SessionId) -> OmsResult<()> {
        debug!(session = %session, message = %message, "Sending");
        self.tx
            .send(OutboundMessage {
                session: session.clone(),
                message,
            })
            .map_err(|_| OmsError::Transport(format!("session {session} is not connected")))
    }
}
