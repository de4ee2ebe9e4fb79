// src/core/types.rs - Core Type Definitions
//! Core type definitions used throughout the order tracker
//!
//! Identifiers, decimal amounts and the FIX session reference that ties an
//! order to the channel it must be sent on.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::OmsError;

/// Internal order identifier, assigned by the registry starting at 1
pub type OrderId = u64;

/// Internal execution identifier, a separate sequence from [`OrderId`]
pub type ExecutionId = u64;

/// Client order ID (FIX tag 11), the correlation token for execution reports
pub type ClOrdId = String;

/// Trading symbol
pub type Symbol = String;

/// Exact decimal price
pub type Price = Decimal;

/// Exact decimal quantity
pub type Quantity = Decimal;

/// BeginString for FIX 4.0
pub const BEGIN_STRING_FIX40: &str = "FIX.4.0";
/// BeginString for FIX 4.1
pub const BEGIN_STRING_FIX41: &str = "FIX.4.1";
/// BeginString for FIX 4.2
pub const BEGIN_STRING_FIX42: &str = "FIX.4.2";
/// BeginString for FIX 4.3
pub const BEGIN_STRING_FIX43: &str = "FIX.4.3";
/// BeginString for FIX 4.4
pub const BEGIN_STRING_FIX44: &str = "FIX.4.4";
/// BeginString for FIX 5.0 application messages over the FIXT.1.1 session layer
pub const BEGIN_STRING_FIXT11: &str = "FIXT.1.1";

/// Identity of a FIX session
///
/// Opaque to everything except the message builders, which dispatch on
/// [`SessionId::begin_string`]. Renders, parses and serializes as
/// `BEGINSTRING:SENDER->TARGET`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    /// Protocol version discriminator
    pub begin_string: String,
    /// SenderCompID
    pub sender_comp_id: String,
    /// TargetCompID
    pub target_comp_id: String,
}

impl SessionId {
    /// Create a session identifier
    pub fn new(begin_string: &str, sender_comp_id: &str, target_comp_id: &str) -> Self {
        Self {
            begin_string: begin_string.to_string(),
            sender_comp_id: sender_comp_id.to_string(),
            target_comp_id: target_comp_id.to_string(),
        }
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}->{}", self.begin_string, self.sender_comp_id, self.target_comp_id)
    }
}

impl FromStr for SessionId {
    type Err = OmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OmsError::Validation(format!("Invalid SessionID: {s}"));
        let (begin_string, comp_ids) = s.split_once(':').ok_or_else(invalid)?;
        let (sender, target) = comp_ids.split_once("->").ok_or_else(invalid)?;
        if begin_string.is_empty() || sender.is_empty() || target.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(begin_string, sender, target))
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
