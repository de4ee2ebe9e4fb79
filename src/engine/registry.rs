// src/engine/registry.rs - Order Registry
//! # Order Registry
//!
//! Owns every order and execution record. Orders are indexed by internal ID
//! and by each ClOrdID they have been sent under; a cancel links a second
//! ClOrdID to the same order.
//!
//! All state sits behind one `RwLock`. Writers (create, ClOrdID assignment,
//! execution report application) take it exclusively, readers share it.
//! Records handed out are clones, so callers never hold a reference into the
//! registry.
//!
//! Each ClOrdID links to exactly one order. A generator that repeats itself
//! gets the duplicate refused rather than re-pointing an existing link.

use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, instrument, warn};

use crate::{
    core::{
        execution::Execution,
        order::{AmountPrecision, Order, OrderRequest},
        types::{ClOrdId, ExecutionId, OrderId},
    },
    engine::{id_generator::ClOrdIdGenerator, sessions::SessionDirectory},
    OmsError, OmsResult,
};

#[derive(Debug)]
struct RegistryState {
    last_order_id: OrderId,
    last_execution_id: ExecutionId,
    orders: HashMap<OrderId, Order>,
    by_clord_id: HashMap<ClOrdId, OrderId>,
    executions: HashMap<ExecutionId, Execution>,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            last_order_id: 0,
            last_execution_id: 0,
            orders: HashMap::new(),
            by_clord_id: HashMap::new(),
            executions: HashMap::new(),
        }
    }

    fn insert_execution(&mut self, mut execution: Execution) -> Execution {
        self.last_execution_id += 1;
        execution.id = self.last_execution_id;
        self.executions.insert(execution.id, execution.clone());
        execution
    }

    fn ensure_unused(&self, clord_id: &str) -> OmsResult<()> {
        if let Some(owner) = self.by_clord_id.get(clord_id) {
            warn!(clord_id, order_id = *owner, "Generator repeated a ClOrdID");
            return Err(OmsError::DuplicateClOrdId(clord_id.to_string()));
        }
        Ok(())
    }
}

/// Result of [`OrderRegistry::update_by_clord_id`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    /// Order after the update
    pub order: Order,
    /// Execution recorded alongside, with its assigned ID
    pub execution: Option<Execution>,
}

/// Registry statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Orders created
    pub orders: usize,
    /// ClOrdIDs linked to orders, cancels included
    pub clord_ids: usize,
    /// Executions recorded
    pub executions: usize,
}

/// Single source of truth for orders and executions
pub struct OrderRegistry {
    generator: Arc<dyn ClOrdIdGenerator>,
    sessions: Arc<SessionDirectory>,
    precision: AmountPrecision,
    state: RwLock<RegistryState>,
}

impl std::fmt::Debug for OrderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderRegistry").field("stats", &self.stats()).finish_non_exhaustive()
    }
}

impl OrderRegistry {
    /// Create an empty registry accepting amounts at the default precision
    pub fn new(generator: Arc<dyn ClOrdIdGenerator>, sessions: Arc<SessionDirectory>) -> Self {
        Self {
            generator,
            sessions,
            precision: AmountPrecision::default(),
            state: RwLock::new(RegistryState::new()),
        }
    }

    /// Accept amounts with up to `precision` decimal places
    #[must_use]
    pub fn with_precision(mut self, precision: AmountPrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Sessions consulted when creating orders
    pub fn sessions(&self) -> &SessionDirectory {
        &self.sessions
    }

    /// Validate a draft and store it as a new order
    ///
    /// Nothing is stored and no identifier is consumed when validation fails.
    /// A ClOrdID the generator has already issued fails with
    /// [`OmsError::DuplicateClOrdId`] and leaves the registry unchanged.
    #[instrument(skip(self, request), fields(symbol = %request.symbol, session = %request.session_id))]
    pub fn create(&self, request: &OrderRequest) -> OmsResult<Order> {
        let terms = request.validate_with(self.precision)?;
        let session = self.sessions.resolve(&request.session_id)?;

        let mut state = self.state.write();
        let clord_id = self.generator.next();
        state.ensure_unused(&clord_id)?;

        state.last_order_id += 1;
        let id = state.last_order_id;

        let order = Order::new(id, clord_id.clone(), session, terms);
        state.by_clord_id.insert(clord_id, id);
        state.orders.insert(id, order.clone());

        debug!(order_id = id, clord_id = %order.clord_id, "Order registered");
        Ok(order)
    }

    /// Order by internal ID
    pub fn get(&self, id: OrderId) -> OmsResult<Order> {
        self.state
            .read()
            .orders
            .get(&id)
            .cloned()
            .ok_or(OmsError::OrderNotFound(id))
    }

    /// Order by any ClOrdID it has been sent under
    pub fn get_by_clord_id(&self, clord_id: &str) -> OmsResult<Order> {
        let state = self.state.read();
        state
            .by_clord_id
            .get(clord_id)
            .and_then(|id| state.orders.get(id))
            .cloned()
            .ok_or_else(|| OmsError::ClOrdIdNotFound(clord_id.to_string()))
    }

    /// Snapshot of every order, by ascending ID
    pub fn list(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.state.read().orders.values().cloned().collect();
        orders.sort_unstable_by_key(|o| o.id);
        orders
    }

    /// Mint a fresh ClOrdID and link it to an existing order
    ///
    /// The order stays reachable under its original ClOrdID too. The returned
    /// order still carries the ClOrdID it was first submitted under.
    #[instrument(skip(self))]
    pub fn assign_new_clord_id(&self, id: OrderId) -> OmsResult<(ClOrdId, Order)> {
        let mut state = self.state.write();
        let order = state.orders.get(&id).cloned().ok_or(OmsError::OrderNotFound(id))?;

        let clord_id = self.generator.next();
        state.ensure_unused(&clord_id)?;
        state.by_clord_id.insert(clord_id.clone(), id);

        info!(order_id = id, orig_clord_id = %order.clord_id, clord_id = %clord_id, "Linked new ClOrdID");
        Ok((clord_id, order))
    }

    /// Store an execution under the next execution ID
    pub fn save_execution(&self, execution: Execution) -> Execution {
        self.state.write().insert_execution(execution)
    }

    /// Execution by ID
    pub fn get_execution(&self, id: ExecutionId) -> OmsResult<Execution> {
        self.state
            .read()
            .executions
            .get(&id)
            .cloned()
            .ok_or(OmsError::ExecutionNotFound(id))
    }

    /// Snapshot of every execution, by ascending ID
    pub fn list_executions(&self) -> Vec<Execution> {
        let mut executions: Vec<Execution> = self.state.read().executions.values().cloned().collect();
        executions.sort_unstable_by_key(|e| e.id);
        executions
    }

    /// Mutate the order linked to `clord_id` under the write lock
    ///
    /// `apply` may return an execution, which is stored in the same critical
    /// section. Returns `Ok(None)` when no order carries `clord_id`; `apply`
    /// is not called in that case. If `apply` fails the order is left as it
    /// was, provided `apply` reports failures before touching it.
    pub fn update_by_clord_id<F>(&self, clord_id: &str, apply: F) -> OmsResult<Option<OrderUpdate>>
    where
        F: FnOnce(&mut Order) -> OmsResult<Option<Execution>>,
    {
        let mut state = self.state.write();
        let Some(id) = state.by_clord_id.get(clord_id).copied() else {
            return Ok(None);
        };
        let Some(mut order) = state.orders.get(&id).cloned() else {
            return Ok(None);
        };

        let execution = apply(&mut order)?;
        state.orders.insert(id, order.clone());
        let execution = execution.map(|e| state.insert_execution(e));

        Ok(Some(OrderUpdate { order, execution }))
    }

    /// Current counts
    pub fn stats(&self) -> RegistryStats {
        let state = self.state.read();
        RegistryStats {
            orders: state.orders.len(),
            clord_ids: state.by_clord_id.len(),
            executions: state.executions.len(),
        }
    }
}
