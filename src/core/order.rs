// src/core/order.rs - Order Domain Models and Validation
//! Order records and the draft they are created from
//!
//! An [`OrderRequest`] is what a trader submits: amounts arrive as text and are
//! only trusted once [`OrderRequest::validate`] has turned them into exact
//! decimals that fit the wire precision. The registry then stamps the resulting [`OrderTerms`] with an
//! internal ID, a ClOrdID and a session to produce an [`Order`].
//!
//! # Price presence
//!
//! ```text
//! OrdType     Price   StopPx
//! Market        -       -
//! Limit         ✓       -
//! Stop          -       ✓
//! StopLimit     ✓       ✓
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::{constants, OmsError, OmsResult};

pub use crate::core::types::{ClOrdId, OrderId, Price, Quantity, SessionId, Symbol};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    /// Buy
    Buy,
    /// Sell
    Sell,
    /// Buy minus
    BuyMinus,
    /// Sell plus
    SellPlus,
    /// Sell short
    SellShort,
    /// Sell short exempt
    SellShortExempt,
}

impl Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
            Self::BuyMinus => write!(f, "Buy Minus"),
            Self::SellPlus => write!(f, "Sell Plus"),
            Self::SellShort => write!(f, "Sell Short"),
            Self::SellShortExempt => write!(f, "Sell Short Exempt"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = OmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" | "1" => Ok(Self::Buy),
            "sell" | "2" => Ok(Self::Sell),
            "buy_minus" | "3" => Ok(Self::BuyMinus),
            "sell_plus" | "4" => Ok(Self::SellPlus),
            "sell_short" | "5" => Ok(Self::SellShort),
            "sell_short_exempt" | "6" => Ok(Self::SellShortExempt),
            _ => Err(OmsError::Validation(format!("Invalid Side: {s}"))),
        }
    }
}

impl OrderSide {
    /// FIX Side(54) value
    pub const fn to_fix(self) -> &'static str {
        match self {
            Self::Buy => "1",
            Self::Sell => "2",
            Self::BuyMinus => "3",
            Self::SellPlus => "4",
            Self::SellShort => "5",
            Self::SellShortExempt => "6",
        }
    }
}

/// Order kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Execute at the best available price
    Market,
    /// Execute at the limit price or better
    Limit,
    /// Becomes a market order once the stop price trades
    Stop,
    /// Becomes a limit order once the stop price trades
    StopLimit,
}

impl Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "Market"),
            Self::Limit => write!(f, "Limit"),
            Self::Stop => write!(f, "Stop"),
            Self::StopLimit => write!(f, "Stop Limit"),
        }
    }
}

impl FromStr for OrderType {
    type Err = OmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "market" | "1" => Ok(Self::Market),
            "limit" | "2" => Ok(Self::Limit),
            "stop" | "3" => Ok(Self::Stop),
            "stop_limit" | "stoplimit" | "4" => Ok(Self::StopLimit),
            _ => Err(OmsError::Validation(format!("Invalid OrdType: {s}"))),
        }
    }
}

impl OrderType {
    /// FIX OrdType(40) value
    pub const fn to_fix(self) -> &'static str {
        match self {
            Self::Market => "1",
            Self::Limit => "2",
            Self::Stop => "3",
            Self::StopLimit => "4",
        }
    }

    /// Whether this kind carries a limit price
    pub const fn requires_limit_price(self) -> bool {
        matches!(self, Self::Limit | Self::StopLimit)
    }

    /// Whether this kind carries a stop price
    pub const fn requires_stop_price(self) -> bool {
        matches!(self, Self::Stop | Self::StopLimit)
    }
}

/// Option right (PutOrCall)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutOrCall {
    /// Put
    Put,
    /// Call
    Call,
}

impl Display for PutOrCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Put => write!(f, "Put"),
            Self::Call => write!(f, "Call"),
        }
    }
}

impl FromStr for PutOrCall {
    type Err = OmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "put" | "0" => Ok(Self::Put),
            "call" | "1" => Ok(Self::Call),
            _ => Err(OmsError::Validation(format!("Invalid PutOrCall: {s}"))),
        }
    }
}

impl PutOrCall {
    /// FIX PutOrCall(201) value
    pub const fn to_fix(self) -> &'static str {
        match self {
            Self::Put => "0",
            Self::Call => "1",
        }
    }
}

/// Decimal places amounts may carry on the wire
///
/// A draft whose Qty, Price or StopPrice has more places than this is
/// rejected, so the stored order and the rendered message always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountPrecision {
    /// Places for Price and StopPx
    pub price: u32,
    /// Places for OrderQty
    pub quantity: u32,
}

impl Default for AmountPrecision {
    fn default() -> Self {
        Self {
            price: constants::DEFAULT_PRICE_PRECISION,
            quantity: constants::DEFAULT_QUANTITY_PRECISION,
        }
    }
}

/// Order draft as submitted by a trader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Trading symbol
    pub symbol: Symbol,
    /// Order side
    pub side: OrderSide,
    /// Order kind
    pub ord_type: OrderType,
    /// Requested quantity, as decimal text
    pub quantity: String,
    /// Limit price, as decimal text
    #[serde(default)]
    pub price: Option<String>,
    /// Stop price, as decimal text
    #[serde(default)]
    pub stop_price: Option<String>,
    /// Trading account
    #[serde(default)]
    pub account: Option<String>,
    /// Target session, in `BEGINSTRING:SENDER->TARGET` form
    pub session_id: String,
    /// SecurityType, e.g. `OPT` or `FUT`
    #[serde(default)]
    pub security_type: Option<String>,
    /// MaturityMonthYear, `YYYYMM`
    #[serde(default)]
    pub maturity_month_year: Option<String>,
    /// MaturityDay, 1 to 31
    #[serde(default)]
    pub maturity_day: Option<u32>,
    /// Option right
    #[serde(default)]
    pub put_or_call: Option<PutOrCall>,
    /// Option strike, as decimal text
    #[serde(default)]
    pub strike_price: Option<String>,
}

/// Validated economic terms of an order, before registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerms {
    /// Trading symbol
    pub symbol: Symbol,
    /// Order side
    pub side: OrderSide,
    /// Order kind
    pub ord_type: OrderType,
    /// Requested quantity
    pub quantity: Quantity,
    /// Limit price, present iff the kind requires one
    pub price: Option<Price>,
    /// Stop price, present iff the kind requires one
    pub stop_price: Option<Price>,
    /// Trading account
    pub account: Option<String>,
    /// Derivative contract fields
    pub contract: ContractTerms,
}

/// Derivative contract fields, all optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractTerms {
    /// SecurityType
    pub security_type: Option<String>,
    /// MaturityMonthYear
    pub maturity_month_year: Option<String>,
    /// MaturityDay
    pub maturity_day: Option<u32>,
    /// Option right
    pub put_or_call: Option<PutOrCall>,
    /// Option strike
    pub strike_price: Option<Price>,
}

impl OrderRequest {
    /// Check the draft against the default wire precision
    ///
    /// Session resolution is left to the caller, which owns the set of known
    /// sessions.
    pub fn validate(&self) -> OmsResult<OrderTerms> {
        self.validate_with(AmountPrecision::default())
    }

    /// Check the draft's fields and convert its amounts to exact decimals
    ///
    /// Amounts with more decimal places than `precision` allows are rejected
    /// rather than rounded.
    pub fn validate_with(&self, precision: AmountPrecision) -> OmsResult<OrderTerms> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(OmsError::Validation("Symbol is required".to_string()));
        }

        let quantity = parse_positive("Qty", &self.quantity)
            .and_then(|qty| within_precision("Qty", qty, precision.quantity))?;

        let price = present(self.price.as_deref());
        let price = match (self.ord_type.requires_limit_price(), price) {
            (true, Some(raw)) => Some(within_precision(
                "Price",
                parse_positive("Price", raw)?,
                precision.price,
            )?),
            (true, None) => return Err(OmsError::Validation("Price is required".to_string())),
            (false, Some(_)) => {
                return Err(OmsError::Validation(format!(
                    "Price not allowed for {} order",
                    self.ord_type
                )))
            }
            (false, None) => None,
        };

        let stop_price = present(self.stop_price.as_deref());
        let stop_price = match (self.ord_type.requires_stop_price(), stop_price) {
            (true, Some(raw)) => Some(within_precision(
                "StopPrice",
                parse_positive("StopPrice", raw)?,
                precision.price,
            )?),
            (true, None) => return Err(OmsError::Validation("StopPrice is required".to_string())),
            (false, Some(_)) => {
                return Err(OmsError::Validation(format!(
                    "StopPrice not allowed for {} order",
                    self.ord_type
                )))
            }
            (false, None) => None,
        };

        Ok(OrderTerms {
            symbol: symbol.to_string(),
            side: self.side,
            ord_type: self.ord_type,
            quantity,
            price,
            stop_price,
            account: present(self.account.as_deref()).map(str::to_string),
            contract: self.contract()?,
        })
    }

    fn contract(&self) -> OmsResult<ContractTerms> {
        if let Some(day) = self.maturity_day {
            if !(1..=31).contains(&day) {
                return Err(OmsError::Validation("Invalid MaturityDay".to_string()));
            }
        }
        let strike_price = present(self.strike_price.as_deref())
            .map(|raw| parse_positive("StrikePrice", raw))
            .transpose()?;

        Ok(ContractTerms {
            security_type: present(self.security_type.as_deref()).map(str::to_string),
            maturity_month_year: present(self.maturity_month_year.as_deref()).map(str::to_string),
            maturity_day: self.maturity_day,
            put_or_call: self.put_or_call,
            strike_price,
        })
    }
}

/// Treat blank form fields as absent
fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_positive(field: &str, raw: &str) -> OmsResult<Decimal> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|_| OmsError::Validation(format!("Invalid {field}")))?;
    if value <= Decimal::ZERO {
        return Err(OmsError::Validation(format!("{field} must be positive")));
    }
    Ok(value)
}

fn within_precision(field: &str, value: Decimal, dp: u32) -> OmsResult<Decimal> {
    if value.normalize().scale() > dp {
        return Err(OmsError::Validation(format!(
            "{field} has more than {dp} decimal places"
        )));
    }
    Ok(value)
}

/// A tracked order
///
/// `closed`, `open` and `avg_px` are the only fields that change after
/// creation, and only through the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Registry-assigned internal ID
    pub id: OrderId,
    /// ClOrdID the order was submitted under
    pub clord_id: ClOrdId,
    /// Trading symbol
    pub symbol: Symbol,
    /// Requested quantity
    pub quantity: Quantity,
    /// Trading account
    pub account: Option<String>,
    /// Session the order is sent on
    #[serde(rename = "session_id")]
    pub session: SessionId,
    /// Order side
    pub side: OrderSide,
    /// Order kind
    pub ord_type: OrderType,
    /// Limit price
    pub price: Option<Price>,
    /// Stop price
    pub stop_price: Option<Price>,
    /// Cumulative filled quantity (CumQty)
    pub closed: Quantity,
    /// Remaining quantity (LeavesQty)
    pub open: Quantity,
    /// Volume-weighted average fill price (AvgPx)
    pub avg_px: Option<Price>,
    /// SecurityType
    pub security_type: Option<String>,
    /// MaturityMonthYear
    pub maturity_month_year: Option<String>,
    /// MaturityDay
    pub maturity_day: Option<u32>,
    /// Option right
    pub put_or_call: Option<PutOrCall>,
    /// Option strike
    pub strike_price: Option<Price>,
}

impl Order {
    /// Create an unfilled order from validated terms
    pub fn new(id: OrderId, clord_id: ClOrdId, session: SessionId, terms: OrderTerms) -> Self {
        Self {
            id,
            clord_id,
            symbol: terms.symbol,
            open: terms.quantity,
            quantity: terms.quantity,
            account: terms.account,
            session,
            side: terms.side,
            ord_type: terms.ord_type,
            price: terms.price,
            stop_price: terms.stop_price,
            closed: Decimal::ZERO,
            avg_px: None,
            security_type: terms.contract.security_type,
            maturity_month_year: terms.contract.maturity_month_year,
            maturity_day: terms.contract.maturity_day,
            put_or_call: terms.contract.put_or_call,
            strike_price: terms.contract.strike_price,
        }
    }

    /// Overwrite the fill state with a cumulative snapshot
    pub fn apply_snapshot(&mut self, cum_qty: Quantity, leaves_qty: Quantity, avg_px: Price) {
        self.closed = cum_qty;
        self.open = leaves_qty;
        self.avg_px = Some(avg_px);
    }
}
