// src/engine/mod.rs - Order Processing Engine
//! # Order Processing Engine
//!
//! [`TradeClient`] is the application side of the FIX session: it takes
//! orders and cancels from the presentation layer, registers them, renders
//! them for the session's FIX version and hands them to the [`Transport`].
//! Execution reports flow back through [`TradeClient::deliver`].

pub mod correlator;
pub mod id_generator;
pub mod registry;
pub mod sessions;

use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::{
    core::{
        execution::Execution,
        order::{Order, OrderRequest},
        types::{ExecutionId, OrderId, SessionId},
    },
    fix::{builder::FixFactory, message::InboundMessage, tags},
    transport::Transport,
    OmsError, OmsResult,
};

pub use correlator::{CorrelationOutcome, ExecutionCorrelator};
pub use id_generator::{ClOrdIdGenerator, SequentialClOrdIdGenerator};
pub use registry::{OrderRegistry, OrderUpdate, RegistryStats};
pub use sessions::SessionDirectory;

/// Trading front end bound to one transport
pub struct TradeClient {
    sessions: Arc<SessionDirectory>,
    registry: Arc<OrderRegistry>,
    correlator: ExecutionCorrelator,
    factory: FixFactory,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for TradeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeClient")
            .field("registry", &self.registry)
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

impl TradeClient {
    /// Create a client with an empty registry and no known sessions
    pub fn new(
        generator: Arc<dyn ClOrdIdGenerator>,
        factory: FixFactory,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let sessions = Arc::new(SessionDirectory::new());
        let registry = Arc::new(
            OrderRegistry::new(generator, sessions.clone()).with_precision(factory.precision()),
        );
        info!(versions = ?factory.supported_versions(), "Initializing trade client");

        Self {
            sessions,
            correlator: ExecutionCorrelator::new(registry.clone()),
            registry,
            factory,
            transport,
        }
    }

    /// Session lifecycle callback: `session` is now usable for orders
    pub fn on_session_created(&self, session: SessionId) {
        self.sessions.register(session);
    }

    /// Established sessions, sorted by name
    pub fn sessions(&self) -> Vec<SessionId> {
        self.sessions.list()
    }

    /// Order registry backing this client
    pub fn registry(&self) -> &Arc<OrderRegistry> {
        &self.registry
    }

    /// BeginStrings this client can render messages for
    pub fn supported_versions(&self) -> Vec<&'static str> {
        self.factory.supported_versions()
    }

    /// Register a new order and send it as a NewOrderSingle
    ///
    /// Fails before anything is registered if the draft is invalid, the
    /// session unknown, or its FIX version unsupported. A transport failure is
    /// reported after the order has been registered; the order stays visible
    /// with nothing filled.
    #[instrument(skip(self, request), fields(symbol = %request.symbol, session = %request.session_id))]
    pub async fn submit_order(&self, request: OrderRequest) -> OmsResult<Order> {
        let session = self.sessions.resolve(&request.session_id)?;
        self.ensure_supported(&session)?;

        let order = self.registry.create(&request)?;
        let msg = self.factory.new_order_single(&order)?;
        self.transport.send(msg, &order.session).await?;

        info!(
            order_id = order.id,
            clord_id = %order.clord_id,
            side = %order.side,
            quantity = %order.quantity,
            "Order submitted"
        );
        Ok(order)
    }

    /// Send an OrderCancelRequest for an existing order
    ///
    /// The cancel goes out under a freshly minted ClOrdID that stays linked to
    /// the order, so its execution reports correlate back.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId) -> OmsResult<Order> {
        let order = self.registry.get(id)?;
        self.ensure_supported(&order.session)?;

        let (clord_id, order) = self.registry.assign_new_clord_id(id)?;
        let msg = self.factory.order_cancel_request(&order, &clord_id)?;
        self.transport.send(msg, &order.session).await?;

        info!(order_id = id, orig_clord_id = %order.clord_id, clord_id = %clord_id, "Cancel requested");
        Ok(order)
    }

    /// All orders
    pub fn list_orders(&self) -> Vec<Order> {
        self.registry.list()
    }

    /// One order by internal ID
    pub fn get_order(&self, id: OrderId) -> OmsResult<Order> {
        self.registry.get(id)
    }

    /// All executions
    pub fn list_executions(&self) -> Vec<Execution> {
        self.registry.list_executions()
    }

    /// One execution by ID
    pub fn get_execution(&self, id: ExecutionId) -> OmsResult<Execution> {
        self.registry.get_execution(id)
    }

    /// Inbound application message callback
    ///
    /// ExecutionReports are correlated; anything else is rejected with
    /// [`OmsError::UnsupportedMessageType`]. An error return is the cue for
    /// the session engine to reject the message at protocol level.
    pub fn deliver(&self, msg: &InboundMessage, session: &SessionId) -> OmsResult<CorrelationOutcome> {
        match msg.msg_type.as_str() {
            tags::msg_type::EXECUTION_REPORT => self.correlator.on_execution_report(msg, session),
            other => {
                error!(msg_type = other, session = %session, "Unsupported message type");
                Err(OmsError::UnsupportedMessageType(other.to_string()))
            }
        }
    }

    fn ensure_supported(&self, session: &SessionId) -> OmsResult<()> {
        if self.factory.supports(&session.begin_string) {
            Ok(())
        } else {
            debug!(session = %session, "No message builder for session");
            Err(OmsError::UnsupportedVersion(session.begin_string.clone()))
        }
    }
}
