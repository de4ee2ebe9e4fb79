// src/fix/mod.rs - FIX Module Declaration
//! FIX application messages
//!
//! Outbound messages are built per BeginString by [`builder::FixFactory`];
//! inbound messages arrive from the transport engine as [`message::InboundMessage`].

pub mod builder;
pub mod message;
pub mod tags;

pub use builder::{BuildContext, FixFactory, MessageBuilder};
pub use message::{InboundMessage, WireMessage};
