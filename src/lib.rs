// src/lib.rs - Trader OMS Library Root
//! # Trader OMS - Order Tracking for a FIX Trading Front End
//!
//! Tracks client orders sent to a counter-party over FIX and reconciles them
//! against the execution reports that come back, unsolicited and in any order,
//! on the same session.
//!
//! ## Features
//!
//! - **Order Registry**: Orders indexed by internal ID and by ClOrdID, behind one
//!   coarse read/write lock
//! - **ClOrdID Generation**: Strictly increasing correlation identifiers
//! - **Execution Correlation**: Cumulative snapshots applied in place, discrete
//!   fills recorded as immutable executions
//! - **Multi-Version FIX**: NewOrderSingle and OrderCancelRequest for FIX.4.0
//!   through FIXT.1.1, one builder per BeginString
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐                         ┌─────────────────┐
//! │   REST API      │                         │  FIX Transport  │
//! │   (HTTP/JSON)   │                         │  (collaborator) │
//! └─────────┬───────┘                         └───┬─────────▲───┘
//!           │ submit / cancel / list              │ deliver │ send
//!           ▼                                     ▼         │
//!    ┌──────────────────────────────────────────────────────┴──┐
//!    │                      TradeClient                        │
//!    └──────┬──────────────────┬──────────────────────┬────────┘
//!           │                  │                      │
//!  ┌────────▼───────┐  ┌───────▼────────┐   ┌────────▼────────┐
//!  │ Order Registry │◄─┤   Correlator   │   │   FixFactory    │
//!  │  (RwLock)      │  │ (exec reports) │   │ (per-version)   │
//!  └────────┬───────┘  └────────────────┘   └─────────────────┘
//!           │
//!  ┌────────▼───────┐
//!  │ ClOrdID Source │
//!  └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trader_oms::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (transport, _outbound) = ChannelTransport::new();
//!     let client = TradeClient::new(
//!         Arc::new(SequentialClOrdIdGenerator::new()),
//!         FixFactory::default(),
//!         Arc::new(transport),
//!     );
//!
//!     let session = SessionId::new("FIX.4.2", "TRADER", "BROKER");
//!     client.on_session_created(session.clone());
//!
//!     let order = client
//!         .submit_order(OrderRequest {
//!             symbol: "IBM".to_string(),
//!             side: OrderSide::Buy,
//!             ord_type: OrderType::Limit,
//!             quantity: "100".to_string(),
//!             price: Some("50.25".to_string()),
//!             stop_price: None,
//!             account: None,
//!             session_id: session.to_string(),
//!             security_type: None,
//!             maturity_month_year: None,
//!             maturity_day: None,
//!             put_or_call: None,
//!             strike_price: None,
//!         })
//!         .await?;
//!     println!("Order submitted: {} ({})", order.id, order.clord_id);
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]
#![deny(missing_docs, unsafe_code)]

use serde::{Deserialize, Serialize};

pub mod core;
pub mod engine;
pub mod fix;
pub mod transport;

pub use crate::core::{
    execution::Execution,
    order::{AmountPrecision, Order, OrderRequest, OrderSide, OrderType, PutOrCall},
    types::{ClOrdId, ExecutionId, OrderId, Price, Quantity, SessionId},
};
pub use crate::engine::{
    correlator::{CorrelationOutcome, ExecutionCorrelator},
    id_generator::{ClOrdIdGenerator, SequentialClOrdIdGenerator},
    registry::OrderRegistry,
    sessions::SessionDirectory,
    TradeClient,
};
pub use crate::fix::{
    builder::{FixFactory, MessageBuilder},
    message::{InboundMessage, WireMessage},
};
pub use crate::transport::{ChannelTransport, OutboundMessage, Transport};

/// Prelude module for convenient imports
pub mod prelude {
    //! Re-exports the types needed to wire up and drive a [`TradeClient`](crate::TradeClient)

    pub use crate::{
        core::{
            execution::Execution,
            order::{Order, OrderRequest, OrderSide, OrderType, PutOrCall},
            types::{ClOrdId, ExecutionId, OrderId, SessionId},
        },
        engine::{
            id_generator::{ClOrdIdGenerator, SequentialClOrdIdGenerator},
            TradeClient,
        },
        fix::{builder::FixFactory, message::InboundMessage},
        transport::{ChannelTransport, Transport},
        OmsError, OmsResult,
    };
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OmsConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// FIX session and rendering configuration
    pub fix: FixConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout: 30,
        }
    }
}

/// FIX configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    /// Sessions the transport engine establishes at start-up
    pub sessions: Vec<SessionConfig>,
    /// Decimal places used when rendering Price and StopPx
    pub price_precision: u32,
    /// Decimal places used when rendering OrderQty
    pub quantity_precision: u32,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            price_precision: constants::DEFAULT_PRICE_PRECISION,
            quantity_precision: constants::DEFAULT_QUANTITY_PRECISION,
        }
    }
}

/// One FIX session as configured for the initiator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// BeginString, e.g. `FIX.4.2`
    pub begin_string: String,
    /// SenderCompID
    pub sender_comp_id: String,
    /// TargetCompID
    pub target_comp_id: String,
}

impl SessionConfig {
    /// Session identifier this configuration describes
    pub fn session_id(&self) -> SessionId {
        SessionId::new(&self.begin_string, &self.sender_comp_id, &self.target_comp_id)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Error types used throughout the library
#[derive(Debug, thiserror::Error)]
pub enum OmsError {
    /// Order draft is malformed, incomplete or targets an unknown session
    #[error("Order validation failed: {0}")]
    Validation(String),

    /// No order with this internal ID
    #[error("could not find order with id {0}")]
    OrderNotFound(OrderId),

    /// No order linked to this ClOrdID
    #[error("could not find order with clordid {0}")]
    ClOrdIdNotFound(ClOrdId),

    /// No execution with this internal ID
    #[error("could not find execution with id {0}")]
    ExecutionNotFound(ExecutionId),

    /// Generator issued a ClOrdID already linked to an order
    #[error("Duplicate ClOrdID: {0}")]
    DuplicateClOrdId(ClOrdId),

    /// Inbound message lacks a required field or carries an unparseable one
    #[error("Malformed message{}: {reason}", tag.map(|t| format!(" (tag {t})")).unwrap_or_default())]
    MalformedMessage {
        /// Offending tag, when one can be named
        tag: Option<u32>,
        /// What is wrong with it
        reason: String,
    },

    /// Inbound application message this client does not handle
    #[error("Unsupported message type: {0}")]
    UnsupportedMessageType(String),

    /// No message builder registered for this BeginString
    #[error("Unhandled BeginString: {0}")]
    UnsupportedVersion(String),

    /// Transport collaborator refused the outbound message
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OmsError {
    /// True for the three lookup failures
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::OrderNotFound(_) | Self::ClOrdIdNotFound(_) | Self::ExecutionNotFound(_)
        )
    }

    pub(crate) fn missing_field(tag: u32) -> Self {
        Self::MalformedMessage {
            tag: Some(tag),
            reason: "required field missing".to_string(),
        }
    }
}

/// Result type used throughout the library
pub type OmsResult<T> = Result<T, OmsError>;

/// Constants used throughout the library
pub mod constants {
    //! System-wide constants

    /// HandlInst sent on every NewOrderSingle: automated execution, private, no broker intervention
    pub const HANDL_INST_AUTOMATED_PRIVATE: &str = "1";

    /// CxlType required on FIX.4.0 OrderCancelRequest: full remaining quantity
    pub const CXL_TYPE_FULL: &str = "F";

    /// Default decimal places for Price and StopPx
    pub const DEFAULT_PRICE_PRECISION: u32 = 2;

    /// Default decimal places for OrderQty
    pub const DEFAULT_QUANTITY_PRECISION: u32 = 0;

    /// TransactTime format with millisecond precision
    pub const UTC_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H:%M:%S%.3f";
}
