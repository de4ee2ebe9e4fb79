// src/core/execution.rs - Execution Records
//! Immutable record of one fill reported against an order

use serde::{Deserialize, Serialize};

use crate::core::{
    order::{Order, OrderSide},
    types::{ExecutionId, Price, Quantity, SessionId, Symbol},
};

/// A single partial or full fill
///
/// Symbol, side and session are copied from the parent order when the fill is
/// recorded; an execution is a historical fact and never follows later changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// Registry-assigned execution ID
    pub id: ExecutionId,
    /// Symbol traded
    pub symbol: Symbol,
    /// Fill quantity (LastShares)
    pub quantity: Quantity,
    /// Side of the parent order
    pub side: OrderSide,
    /// Fill price (LastPx)
    pub price: Price,
    /// Session of the parent order
    #[serde(rename = "session_id")]
    pub session: SessionId,
}

impl Execution {
    /// Record a fill against `order`; the ID is left at 0 until the registry saves it
    pub fn from_fill(order: &Order, quantity: Quantity, price: Price) -> Self {
        Self {
            id: 0,
            symbol: order.symbol.clone(),
            quantity,
            side: order.side,
            price,
            session: order.session.clone(),
        }
    }
}
