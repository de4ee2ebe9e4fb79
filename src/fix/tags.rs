// src/fix/tags.rs - FIX Tag Numbers
//! Tag numbers and MsgType values used by the order flow

/// Account
pub const ACCOUNT: u32 = 1;
/// AvgPx
pub const AVG_PX: u32 = 6;
/// BeginString
pub const BEGIN_STRING: u32 = 8;
/// ClOrdID
pub const CL_ORD_ID: u32 = 11;
/// CumQty
pub const CUM_QTY: u32 = 14;
/// HandlInst
pub const HANDL_INST: u32 = 21;
/// LastPx
pub const LAST_PX: u32 = 31;
/// LastShares (LastQty from FIX 4.3)
pub const LAST_SHARES: u32 = 32;
/// MsgType
pub const MSG_TYPE: u32 = 35;
/// OrderQty
pub const ORDER_QTY: u32 = 38;
/// OrdType
pub const ORD_TYPE: u32 = 40;
/// OrigClOrdID
pub const ORIG_CL_ORD_ID: u32 = 41;
/// Price
pub const PRICE: u32 = 44;
/// SenderCompID
pub const SENDER_COMP_ID: u32 = 49;
/// Side
pub const SIDE: u32 = 54;
/// Symbol
pub const SYMBOL: u32 = 55;
/// TargetCompID
pub const TARGET_COMP_ID: u32 = 56;
/// Text
pub const TEXT: u32 = 58;
/// TransactTime
pub const TRANSACT_TIME: u32 = 60;
/// StopPx
pub const STOP_PX: u32 = 99;
/// CxlType (FIX 4.0 only)
pub const CXL_TYPE: u32 = 125;
/// LeavesQty
pub const LEAVES_QTY: u32 = 151;

/// MsgType values
pub mod msg_type {
    /// ExecutionReport
    pub const EXECUTION_REPORT: &str = "8";
    /// NewOrderSingle
    pub const NEW_ORDER_SINGLE: &str = "D";
    /// OrderCancelRequest
    pub const ORDER_CANCEL_REQUEST: &str = "F";
}
