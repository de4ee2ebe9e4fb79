// src/core/mod.rs - Core Module Declaration
//! Core domain records
//!
//! Orders, executions and the identifier types shared by the registry, the
//! correlator and the message builders.

pub mod execution;
pub mod order;
pub mod types;

pub use execution::Execution;
pub use order::{
    AmountPrecision, ContractTerms, Order, OrderRequest, OrderSide, OrderTerms, OrderType, PutOrCall,
};
pub use types::{ClOrdId, ExecutionId, OrderId, Price, Quantity, SessionId, Symbol};
