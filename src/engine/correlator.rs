// src/engine/correlator.rs - Execution Report Correlation
//! # Execution Correlator
//!
//! Applies inbound ExecutionReports to the orders they reference.
//!
//! ```text
//! ExecutionReport
//!      │
//!      ├─ ClOrdID(11) missing ───────────────► MalformedMessage
//!      │
//!      ├─ ClOrdID unknown ───────────────────► warn, Unmatched (no mutation)
//!      │
//!      ├─ CumQty/AvgPx/LeavesQty unparseable ► MalformedMessage (no mutation)
//!      │
//!      └─ apply snapshot ─┬─ LastShares(32) present ─► record Execution
//!                         └─ absent ─────────────────► snapshot only
//! ```
//!
//! CumQty, LeavesQty and AvgPx are cumulative, so the last report applied
//! wins and replaying the same report changes nothing.

use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::{
    core::{
        execution::Execution,
        order::Order,
        types::{ClOrdId, Price, Quantity, SessionId},
    },
    engine::registry::OrderRegistry,
    fix::{message::InboundMessage, tags},
    OmsError, OmsResult,
};

/// What became of one execution report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationOutcome {
    /// The report matched an order and was applied
    Applied {
        /// Order after the snapshot was applied
        order: Order,
        /// Fill recorded from LastShares/LastPx, if the report carried one
        execution: Option<Execution>,
    },
    /// No order carries the report's ClOrdID; nothing changed
    Unmatched {
        /// The unknown ClOrdID
        clord_id: ClOrdId,
    },
}

/// Fields read from an execution report, parsed up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReportFields {
    cum_qty: Quantity,
    avg_px: Price,
    leaves_qty: Quantity,
    last_fill: Option<(Quantity, Price)>,
}

impl ReportFields {
    fn parse(msg: &InboundMessage) -> OmsResult<Self> {
        let cum_qty = msg.decimal(tags::CUM_QTY)?;
        let avg_px = msg.decimal(tags::AVG_PX)?;
        let leaves_qty = msg.decimal(tags::LEAVES_QTY)?;

        let last_fill = match msg.optional_decimal(tags::LAST_SHARES)? {
            Some(last_shares) => Some((last_shares, msg.decimal(tags::LAST_PX)?)),
            None => None,
        };

        Ok(Self {
            cum_qty,
            avg_px,
            leaves_qty,
            last_fill,
        })
    }
}

/// Reconciles execution reports against the registry
#[derive(Debug, Clone)]
pub struct ExecutionCorrelator {
    registry: Arc<OrderRegistry>,
}

impl ExecutionCorrelator {
    /// Correlator writing into `registry`
    pub fn new(registry: Arc<OrderRegistry>) -> Self {
        Self { registry }
    }

    /// Apply one execution report
    ///
    /// Lookup, parsing and mutation all happen under the registry's write
    /// lock, so readers never see a half-applied report.
    #[instrument(skip(self, msg, session), fields(session = %session))]
    pub fn on_execution_report(
        &self,
        msg: &InboundMessage,
        session: &SessionId,
    ) -> OmsResult<CorrelationOutcome> {
        let clord_id = msg.require(tags::CL_ORD_ID).inspect_err(|e| {
            error!(error = %e, "Execution report without ClOrdID");
        })?;

        let update = self
            .registry
            .update_by_clord_id(clord_id, |order| {
                let fields = ReportFields::parse(msg)?;
                order.apply_snapshot(fields.cum_qty, fields.leaves_qty, fields.avg_px);
                Ok(fields
                    .last_fill
                    .map(|(quantity, price)| Execution::from_fill(order, quantity, price)))
            })
            .inspect_err(|e| {
                error!(clord_id, error = %e, "Rejecting malformed execution report");
            })?;

        let Some(update) = update else {
            warn!(clord_id, "could not find order for execution report; discarding");
            return Ok(CorrelationOutcome::Unmatched {
                clord_id: clord_id.to_string(),
            });
        };

        debug!(
            order_id = update.order.id,
            closed = %update.order.closed,
            open = %update.order.open,
            execution_id = update.execution.as_ref().map(|e| e.id),
            "Execution report applied"
        );

        Ok(CorrelationOutcome::Applied {
            order: update.order,
            execution: update.execution,
        })
    }

    /// Same as [`Self::on_execution_report`] but for raw `tag=value` text
    pub fn on_raw_execution_report(&self, raw: &str, session: &SessionId) -> OmsResult<CorrelationOutcome> {
        let msg = InboundMessage::parse(raw)?;
        if msg.msg_type != tags::msg_type::EXECUTION_REPORT {
            return Err(OmsError::UnsupportedMessageType(msg.msg_type));
        }
        self.on_execution_report(&msg, session)
    }
}
