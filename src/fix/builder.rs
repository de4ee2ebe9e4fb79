// src/fix/builder.rs - Version-Specific Message Construction
//! NewOrderSingle and OrderCancelRequest construction per FIX version
//!
//! Each supported BeginString has its own [`MessageBuilder`]. [`FixFactory`]
//! keeps them in a lookup table keyed by BeginString, so adding a version is a
//! matter of registering another builder.
//!
//! ## Field presence
//!
//! ```text
//!                 4.0  4.1  4.2  4.3  4.4  FIXT.1.1
//! NewOrderSingle
//!   HandlInst      ✓    ✓    ✓    ✓    ✓    ✓
//!   TransactTime   -    -    ✓    ✓    ✓    ✓
//! OrderCancelRequest
//!   CxlType        ✓    -    -    -    -    -
//!   OrderQty       ✓    ✓    -    -    -    -
//!   TransactTime   -    -    ✓    ✓    ✓    ✓
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use tracing::debug;

use crate::{
    constants,
    core::{
        order::{AmountPrecision, Order},
        types::{
            BEGIN_STRING_FIX40, BEGIN_STRING_FIX41, BEGIN_STRING_FIX42, BEGIN_STRING_FIX43,
            BEGIN_STRING_FIX44, BEGIN_STRING_FIXT11,
        },
    },
    fix::{message::WireMessage, tags},
    OmsError, OmsResult,
};

/// Inputs a builder needs besides the order itself
#[derive(Debug, Clone, Copy)]
pub struct BuildContext {
    /// Value for TransactTime where the version carries it
    pub transact_time: DateTime<Utc>,
    /// Decimal places for Price and StopPx
    pub price_precision: u32,
    /// Decimal places for OrderQty
    pub quantity_precision: u32,
}

impl BuildContext {
    fn price(&self, value: Decimal) -> String {
        fixed(value, self.price_precision)
    }

    fn quantity(&self, value: Decimal) -> String {
        fixed(value, self.quantity_precision)
    }

    fn transact_time(&self) -> String {
        self.transact_time.format(constants::UTC_TIMESTAMP_FORMAT).to_string()
    }
}

/// Render with exactly `dp` places
///
/// Registered orders never exceed the factory's precision, so rounding only
/// ever pads with zeros for them.
fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.prec$}", prec = dp as usize)
}

/// Renders orders for one FIX version
pub trait MessageBuilder: Send + Sync {
    /// BeginString this builder renders for
    fn begin_string(&self) -> &'static str;

    /// NewOrderSingle for `order`
    fn new_order_single(&self, order: &Order, ctx: &BuildContext) -> WireMessage;

    /// OrderCancelRequest for `order`, sent under `clord_id`
    fn order_cancel_request(&self, order: &Order, clord_id: &str, ctx: &BuildContext) -> WireMessage;
}

/// Fields every NewOrderSingle carries, plus prices for the order kind
fn new_order_base(begin_string: &str, order: &Order, ctx: &BuildContext) -> WireMessage {
    let mut msg = WireMessage::new(begin_string, tags::msg_type::NEW_ORDER_SINGLE);
    msg.set(tags::CL_ORD_ID, order.clord_id.as_str())
        .set(tags::HANDL_INST, constants::HANDL_INST_AUTOMATED_PRIVATE)
        .set(tags::SYMBOL, order.symbol.as_str())
        .set(tags::SIDE, order.side.to_fix())
        .set(tags::ORDER_QTY, ctx.quantity(order.quantity))
        .set(tags::ORD_TYPE, order.ord_type.to_fix());

    if let Some(account) = &order.account {
        msg.set(tags::ACCOUNT, account.as_str());
    }
    if let (true, Some(price)) = (order.ord_type.requires_limit_price(), order.price) {
        msg.set(tags::PRICE, ctx.price(price));
    }
    if let (true, Some(stop_px)) = (order.ord_type.requires_stop_price(), order.stop_price) {
        msg.set(tags::STOP_PX, ctx.price(stop_px));
    }
    msg
}

fn cancel_base(begin_string: &str, order: &Order, clord_id: &str) -> WireMessage {
    let mut msg = WireMessage::new(begin_string, tags::msg_type::ORDER_CANCEL_REQUEST);
    msg.set(tags::ORIG_CL_ORD_ID, order.clord_id.as_str())
        .set(tags::CL_ORD_ID, clord_id)
        .set(tags::SYMBOL, order.symbol.as_str())
        .set(tags::SIDE, order.side.to_fix());
    msg
}

/// FIX 4.0
#[derive(Debug, Clone, Copy, Default)]
pub struct Fix40Builder;

impl MessageBuilder for Fix40Builder {
    fn begin_string(&self) -> &'static str {
        BEGIN_STRING_FIX40
    }

    fn new_order_single(&self, order: &Order, ctx: &BuildContext) -> WireMessage {
        new_order_base(BEGIN_STRING_FIX40, order, ctx)
    }

    fn order_cancel_request(&self, order: &Order, clord_id: &str, ctx: &BuildContext) -> WireMessage {
        let mut msg = cancel_base(BEGIN_STRING_FIX40, order, clord_id);
        msg.set(tags::CXL_TYPE, constants::CXL_TYPE_FULL)
            .set(tags::ORDER_QTY, ctx.quantity(order.quantity));
        msg
    }
}

/// FIX 4.1
#[derive(Debug, Clone, Copy, Default)]
pub struct Fix41Builder;

impl MessageBuilder for Fix41Builder {
    fn begin_string(&self) -> &'static str {
        BEGIN_STRING_FIX41
    }

    fn new_order_single(&self, order: &Order, ctx: &BuildContext) -> WireMessage {
        new_order_base(BEGIN_STRING_FIX41, order, ctx)
    }

    fn order_cancel_request(&self, order: &Order, clord_id: &str, ctx: &BuildContext) -> WireMessage {
        let mut msg = cancel_base(BEGIN_STRING_FIX41, order, clord_id);
        msg.set(tags::ORDER_QTY, ctx.quantity(order.quantity));
        msg
    }
}

/// FIX 4.2 and later share one shape; only the BeginString differs
macro_rules! timestamped_builder {
    ($(#[$doc:meta])* $name:ident, $begin_string:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl MessageBuilder for $name {
            fn begin_string(&self) -> &'static str {
                $begin_string
            }

            fn new_order_single(&self, order: &Order, ctx: &BuildContext) -> WireMessage {
                let mut msg = new_order_base($begin_string, order, ctx);
                msg.set(tags::TRANSACT_TIME, ctx.transact_time());
                msg
            }

            fn order_cancel_request(
                &self,
                order: &Order,
                clord_id: &str,
                ctx: &BuildContext,
            ) -> WireMessage {
                let mut msg = cancel_base($begin_string, order, clord_id);
                msg.set(tags::TRANSACT_TIME, ctx.transact_time());
                msg
            }
        }
    };
}

timestamped_builder!(
    /// FIX 4.2
    Fix42Builder,
    BEGIN_STRING_FIX42
);
timestamped_builder!(
    /// FIX 4.3
    Fix43Builder,
    BEGIN_STRING_FIX43
);
timestamped_builder!(
    /// FIX 4.4
    Fix44Builder,
    BEGIN_STRING_FIX44
);
timestamped_builder!(
    /// FIX 5.0 over FIXT.1.1
    Fix50Builder,
    BEGIN_STRING_FIXT11
);

/// Builder lookup table keyed by BeginString
pub struct FixFactory {
    builders: HashMap<&'static str, Box<dyn MessageBuilder>>,
    price_precision: u32,
    quantity_precision: u32,
}

impl Default for FixFactory {
    fn default() -> Self {
        Self::new(constants::DEFAULT_PRICE_PRECISION, constants::DEFAULT_QUANTITY_PRECISION)
    }
}

impl std::fmt::Debug for FixFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixFactory")
            .field("versions", &self.supported_versions())
            .field("price_precision", &self.price_precision)
            .field("quantity_precision", &self.quantity_precision)
            .finish()
    }
}

impl FixFactory {
    /// Factory with every built-in version registered
    pub fn new(price_precision: u32, quantity_precision: u32) -> Self {
        let mut factory = Self::empty(price_precision, quantity_precision);
        factory.register(Box::new(Fix40Builder));
        factory.register(Box::new(Fix41Builder));
        factory.register(Box::new(Fix42Builder));
        factory.register(Box::new(Fix43Builder));
        factory.register(Box::new(Fix44Builder));
        factory.register(Box::new(Fix50Builder));
        factory
    }

    /// Factory with no versions registered
    pub fn empty(price_precision: u32, quantity_precision: u32) -> Self {
        Self {
            builders: HashMap::new(),
            price_precision,
            quantity_precision,
        }
    }

    /// Add or replace the builder for its BeginString
    pub fn register(&mut self, builder: Box<dyn MessageBuilder>) {
        debug!(begin_string = builder.begin_string(), "Registering message builder");
        self.builders.insert(builder.begin_string(), builder);
    }

    /// Decimal places this factory renders amounts with
    pub const fn precision(&self) -> AmountPrecision {
        AmountPrecision {
            price: self.price_precision,
            quantity: self.quantity_precision,
        }
    }

    /// Whether messages can be rendered for `begin_string`
    pub fn supports(&self, begin_string: &str) -> bool {
        self.builders.contains_key(begin_string)
    }

    /// Registered BeginStrings, sorted
    pub fn supported_versions(&self) -> Vec<&'static str> {
        let mut versions: Vec<_> = self.builders.keys().copied().collect();
        versions.sort_unstable();
        versions
    }

    /// NewOrderSingle for the order's session version, stamped now
    pub fn new_order_single(&self, order: &Order) -> OmsResult<WireMessage> {
        self.new_order_single_at(order, Utc::now())
    }

    /// NewOrderSingle with an explicit TransactTime
    pub fn new_order_single_at(&self, order: &Order, transact_time: DateTime<Utc>) -> OmsResult<WireMessage> {
        let builder = self.builder_for(&order.session.begin_string)?;
        Ok(builder.new_order_single(order, &self.context(transact_time)))
    }

    /// OrderCancelRequest for the order's session version, stamped now
    pub fn order_cancel_request(&self, order: &Order, clord_id: &str) -> OmsResult<WireMessage> {
        self.order_cancel_request_at(order, clord_id, Utc::now())
    }

    /// OrderCancelRequest with an explicit TransactTime
    pub fn order_cancel_request_at(
        &self,
        order: &Order,
        clord_id: &str,
        transact_time: DateTime<Utc>,
    ) -> OmsResult<WireMessage> {
        let builder = self.builder_for(&order.session.begin_string)?;
        Ok(builder.order_cancel_request(order, clord_id, &self.context(transact_time)))
    }

    fn builder_for(&self, begin_string: &str) -> OmsResult<&dyn MessageBuilder> {
        self.builders
            .get(begin_string)
            .map(|builder| &**builder)
            .ok_or_else(|| OmsError::UnsupportedVersion(begin_string.to_string()))
    }

    fn context(&self, transact_time: DateTime<Utc>) -> BuildContext {
        BuildContext {
            transact_time,
            price_precision: self.price_precision,
            quantity_precision: self.quantity_precision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        order::{OrderRequest, OrderSide, OrderType},
        types::SessionId,
    };
    use chrono::TimeZone;

    const ALL_VERSIONS: [&str; 6] = [
        BEGIN_STRING_FIX40,
        BEGIN_STRING_FIX41,
        BEGIN_STRING_FIX42,
        BEGIN_STRING_FIX43,
        BEGIN_STRING_FIX44,
        BEGIN_STRING_FIXT11,
    ];

    fn order(begin_string: &str, ord_type: OrderType, price: Option<&str>, stop: Option<&str>) -> Order {
        let request = OrderRequest {
            symbol: "IBM".to_string(),
            side: OrderSide::Buy,
            ord_type,
            quantity: "100".to_string(),
            price: price.map(str::to_string),
            stop_price: stop.map(str::to_string),
            account: None,
            session_id: String::new(),
            security_type: None,
            maturity_month_year: None,
            maturity_day: None,
            put_or_call: None,
            strike_price: None,
        };
        Order::new(
            1,
            "1".to_string(),
            SessionId::new(begin_string, "TW", "ISLD"),
            request.validate().unwrap(),
        )
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 5).unwrap()
    }

    #[test]
    fn test_limit_order_carries_price_on_every_version() {
        let factory = FixFactory::default();
        for version in ALL_VERSIONS {
            let msg = factory
                .new_order_single_at(&order(version, OrderType::Limit, Some("50.25"), None), at())
                .unwrap();
            assert_eq!(msg.begin_string(), version);
            assert_eq!(msg.msg_type(), "D");
            assert_eq!(msg.get(tags::PRICE), Some("50.25"), "{version}");
            assert!(!msg.has(tags::STOP_PX), "{version}");
        }
    }

    #[test]
    fn test_market_order_omits_prices_on_every_version() {
        let factory = FixFactory::default();
        for version in ALL_VERSIONS {
            let msg = factory
                .new_order_single_at(&order(version, OrderType::Market, None, None), at())
                .unwrap();
            assert!(!msg.has(tags::PRICE), "{version}");
            assert!(!msg.has(tags::STOP_PX), "{version}");
        }
    }

    #[test]
    fn test_stop_orders() {
        let factory = FixFactory::default();
        let stop = factory
            .new_order_single_at(&order(BEGIN_STRING_FIX44, OrderType::Stop, None, Some("49")), at())
            .unwrap();
        assert_eq!(stop.get(tags::STOP_PX), Some("49.00"));
        assert!(!stop.has(tags::PRICE));

        let stop_limit = factory
            .new_order_single_at(
                &order(BEGIN_STRING_FIX44, OrderType::StopLimit, Some("50.5"), Some("49.75")),
                at(),
            )
            .unwrap();
        assert_eq!(stop_limit.get(tags::PRICE), Some("50.50"));
        assert_eq!(stop_limit.get(tags::STOP_PX), Some("49.75"));
        assert_eq!(stop_limit.get(tags::ORD_TYPE), Some("4"));
    }

    #[test]
    fn test_amounts_finer_than_factory_precision_never_reach_a_builder() {
        let factory = FixFactory::default();
        let request = |quantity: &str, stop: &str| OrderRequest {
            symbol: "IBM".to_string(),
            side: OrderSide::Buy,
            ord_type: OrderType::StopLimit,
            quantity: quantity.to_string(),
            price: Some("50.5".to_string()),
            stop_price: Some(stop.to_string()),
            account: None,
            session_id: String::new(),
            security_type: None,
            maturity_month_year: None,
            maturity_day: None,
            put_or_call: None,
            strike_price: None,
        };

        assert!(matches!(
            request("100", "49.999").validate_with(factory.precision()),
            Err(OmsError::Validation(_))
        ));
        assert!(matches!(
            request("100.5", "49.75").validate_with(factory.precision()),
            Err(OmsError::Validation(_))
        ));

        // A finer factory takes the same amounts and renders them unchanged
        let fine = FixFactory::new(3, 1);
        let terms = request("100.5", "49.999").validate_with(fine.precision()).unwrap();
        let o = Order::new(1, "1".to_string(), SessionId::new(BEGIN_STRING_FIX44, "TW", "ISLD"), terms);
        let msg = fine.new_order_single_at(&o, at()).unwrap();
        assert_eq!(msg.get(tags::STOP_PX), Some("49.999"));
        assert_eq!(msg.get(tags::PRICE), Some("50.500"));
        assert_eq!(msg.get(tags::ORDER_QTY), Some("100.5"));
    }

    #[test]
    fn test_new_order_single_fix40_is_exact() {
        let msg = FixFactory::default()
            .new_order_single_at(&order(BEGIN_STRING_FIX40, OrderType::Limit, Some("50.25"), None), at())
            .unwrap();
        assert_eq!(msg.to_string(), "8=FIX.4.0|35=D|11=1|21=1|38=100|40=2|44=50.25|54=1|55=IBM");
    }

    #[test]
    fn test_new_order_single_fix42_is_exact() {
        let msg = FixFactory::default()
            .new_order_single_at(&order(BEGIN_STRING_FIX42, OrderType::Market, None, None), at())
            .unwrap();
        assert_eq!(
            msg.to_string(),
            "8=FIX.4.2|35=D|11=1|21=1|38=100|40=1|54=1|55=IBM|60=20240315-14:30:05.000"
        );
    }

    #[test]
    fn test_transact_time_presence_by_version() {
        let factory = FixFactory::default();
        for version in ALL_VERSIONS {
            let msg = factory
                .new_order_single_at(&order(version, OrderType::Market, None, None), at())
                .unwrap();
            let expected = !matches!(version, BEGIN_STRING_FIX40 | BEGIN_STRING_FIX41);
            assert_eq!(msg.has(tags::TRANSACT_TIME), expected, "{version}");
            assert_eq!(msg.get(tags::HANDL_INST), Some("1"), "{version}");
        }
    }

    #[test]
    fn test_account_is_optional() {
        let factory = FixFactory::default();
        let mut o = order(BEGIN_STRING_FIX42, OrderType::Market, None, None);
        assert!(!factory.new_order_single_at(&o, at()).unwrap().has(tags::ACCOUNT));

        o.account = Some("ACCT1".to_string());
        let msg = factory.new_order_single_at(&o, at()).unwrap();
        assert_eq!(msg.get(tags::ACCOUNT), Some("ACCT1"));
    }

    #[test]
    fn test_cancel_request_references_original() {
        let factory = FixFactory::default();
        let o = order(BEGIN_STRING_FIX42, OrderType::Limit, Some("50.25"), None);
        let msg = factory.order_cancel_request_at(&o, "2", at()).unwrap();
        assert_eq!(
            msg.to_string(),
            "8=FIX.4.2|35=F|11=2|41=1|54=1|55=IBM|60=20240315-14:30:05.000"
        );
    }

    #[test]
    fn test_cancel_request_fields_by_version() {
        let factory = FixFactory::default();

        let fix40 = factory
            .order_cancel_request_at(&order(BEGIN_STRING_FIX40, OrderType::Market, None, None), "2", at())
            .unwrap();
        assert_eq!(fix40.get(tags::CXL_TYPE), Some("F"));
        assert_eq!(fix40.get(tags::ORDER_QTY), Some("100"));
        assert!(!fix40.has(tags::TRANSACT_TIME));

        let fix41 = factory
            .order_cancel_request_at(&order(BEGIN_STRING_FIX41, OrderType::Market, None, None), "2", at())
            .unwrap();
        assert!(!fix41.has(tags::CXL_TYPE));
        assert_eq!(fix41.get(tags::ORDER_QTY), Some("100"));

        for version in [BEGIN_STRING_FIX43, BEGIN_STRING_FIX44, BEGIN_STRING_FIXT11] {
            let msg = factory
                .order_cancel_request_at(&order(version, OrderType::Market, None, None), "2", at())
                .unwrap();
            assert_eq!(msg.get(tags::ORIG_CL_ORD_ID), Some("1"));
            assert_eq!(msg.get(tags::CL_ORD_ID), Some("2"));
            assert!(msg.has(tags::TRANSACT_TIME));
            assert!(!msg.has(tags::ORDER_QTY));
        }
    }

    #[test]
    fn test_unsupported_version() {
        let factory = FixFactory::default();
        let o = order("FIX.3.9", OrderType::Market, None, None);
        assert!(matches!(
            factory.new_order_single(&o),
            Err(OmsError::UnsupportedVersion(v)) if v == "FIX.3.9"
        ));
        assert!(matches!(
            factory.order_cancel_request(&o, "2"),
            Err(OmsError::UnsupportedVersion(_))
        ));
        assert!(!factory.supports("FIX.3.9"));
    }

    #[test]
    fn test_registry_of_builders() {
        let mut factory = FixFactory::empty(2, 0);
        assert!(factory.supported_versions().is_empty());
        factory.register(Box::new(Fix44Builder));
        assert_eq!(factory.supported_versions(), vec![BEGIN_STRING_FIX44]);
        assert!(factory.supports(BEGIN_STRING_FIX44));
        assert!(!factory.supports(BEGIN_STRING_FIX42));

        assert_eq!(FixFactory::default().supported_versions().len(), 6);
        assert_eq!(FixFactory::default().precision(), AmountPrecision::default());
        assert_eq!(factory.precision(), AmountPrecision { price: 2, quantity: 0 });
    }

    #[test]
    fn test_precision_rounding() {
        assert_eq!(fixed(Decimal::new(5025, 2), 2), "50.25");
        assert_eq!(fixed(Decimal::new(50, 0), 2), "50.00");
        assert_eq!(fixed(Decimal::new(1005, 3), 2), "1.01");
        assert_eq!(fixed(Decimal::new(1005, 1), 0), "101");

        let factory = FixFactory::new(4, 2);
        let msg = factory
            .new_order_single_at(&order(BEGIN_STRING_FIX42, OrderType::Limit, Some("50.25"), None), at())
            .unwrap();
        assert_eq!(msg.get(tags::PRICE), Some("50.2500"));
        assert_eq!(msg.get(tags::ORDER_QTY), Some("100.00"));
    }
}
