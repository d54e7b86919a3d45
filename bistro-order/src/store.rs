use bistro_catalog::{Catalog, CatalogError};
use bistro_core::PaymentMethod;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::changes::ChangeHandler;
use crate::models::{Order, OrderStatus, PaymentStatus};

/// Result of a successful status transition
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub order: Order,
}

struct StoreState {
    orders: BTreeMap<u64, Order>,
    next_id: u64,
    /// Orders with a charge in flight; at most one per order
    paying: HashSet<u64>,
}

impl StoreState {
    fn ensure_not_paying(&self, order_id: u64) -> Result<(), OrderError> {
        if self.paying.contains(&order_id) {
            return Err(OrderError::PaymentInProgress(order_id));
        }
        Ok(())
    }
}

/// Owns every order, allocates ids and enforces the status graph.
///
/// All mutations go through one lock, so concurrent edits to the same order
/// are applied one after another. Callers only ever receive copies.
pub struct OrderStore {
    catalog: Arc<dyn Catalog>,
    state: Mutex<StoreState>,
}

impl OrderStore {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            state: Mutex::new(StoreState {
                orders: BTreeMap::new(),
                next_id: 1,
                paying: HashSet::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new order for a table
    pub fn create_order(&self, table_number: u32) -> Result<Order, OrderError> {
        if table_number == 0 {
            return Err(OrderError::InvalidTableNumber(table_number));
        }

        let mut state = self.state();
        let order = Order::new(state.next_id, table_number);
        state.next_id += 1;
        state.orders.insert(order.id, order.clone());

        tracing::info!("Created order #{} for table {}", order.id, table_number);
        Ok(order)
    }

    pub fn get_order(&self, order_id: u64) -> Result<Order, OrderError> {
        self.state()
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(OrderError::NotFound(order_id))
    }

    /// Add `quantity` of a menu item, merging with an existing line
    pub fn add_line(&self, order_id: u64, item_name: &str, quantity: u32) -> Result<Order, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity(quantity));
        }
        if !self.state().orders.contains_key(&order_id) {
            return Err(OrderError::NotFound(order_id));
        }

        // Catalog lookup happens outside the store lock
        let item = self.catalog.find(item_name)?;

        let mut state = self.state();
        state.ensure_not_paying(order_id)?;
        let order = Self::order_mut(&mut state, order_id)?;
        ChangeHandler::add_line(order, &item, quantity)?;

        tracing::info!("Order #{}: added {} x{}", order_id, item_name, quantity);
        Ok(order.clone())
    }

    /// Take `quantity` of an item off the order. `Ok(false)` if it was not there.
    pub fn remove_line(&self, order_id: u64, item_name: &str, quantity: u32) -> Result<bool, OrderError> {
        let mut state = self.state();
        state.ensure_not_paying(order_id)?;
        let order = Self::order_mut(&mut state, order_id)?;
        let removed = ChangeHandler::remove_line(order, item_name, quantity)?;

        if removed {
            tracing::info!("Order #{}: removed {} x{}", order_id, item_name, quantity);
        }
        Ok(removed)
    }

    /// Move an order to `target` if the status graph allows it
    pub fn transition(&self, order_id: u64, target: OrderStatus) -> Result<StatusChange, OrderError> {
        let mut state = self.state();
        let order = Self::order_mut(&mut state, order_id)?;
        let from = Self::guard(order, target)?;

        order.update_status(target);
        tracing::info!("Order #{}: {} -> {}", order_id, from.as_str(), target.as_str());

        Ok(StatusChange {
            from,
            order: order.clone(),
        })
    }

    /// Transition: Created → Preparing
    pub fn submit_to_kitchen(&self, order_id: u64) -> Result<StatusChange, OrderError> {
        self.transition(order_id, OrderStatus::Preparing)
    }

    /// Transition: Preparing → Ready
    pub fn mark_ready(&self, order_id: u64) -> Result<StatusChange, OrderError> {
        self.transition(order_id, OrderStatus::Ready)
    }

    /// Transition: Ready → Delivered
    pub fn deliver(&self, order_id: u64) -> Result<StatusChange, OrderError> {
        self.transition(order_id, OrderStatus::Delivered)
    }

    /// Reserve a payable order for one charge and return the snapshot to bill.
    ///
    /// Until `record_payment` or `cancel_payment`, a second reservation and
    /// line edits fail with `PaymentInProgress`.
    pub fn begin_payment(&self, order_id: u64) -> Result<Order, OrderError> {
        let mut state = self.state();
        state.ensure_not_paying(order_id)?;
        let order = Self::order_mut(&mut state, order_id)?;
        Self::guard(order, OrderStatus::Completed)?;

        let order = order.clone();
        state.paying.insert(order_id);
        Ok(order)
    }

    /// Drop the reservation after a declined charge
    pub fn cancel_payment(&self, order_id: u64) {
        self.state().paying.remove(&order_id);
    }

    /// Mark the order paid and complete it, releasing any reservation
    pub fn record_payment(&self, order_id: u64, method: PaymentMethod) -> Result<StatusChange, OrderError> {
        let mut state = self.state();
        state.paying.remove(&order_id);
        let order = Self::order_mut(&mut state, order_id)?;
        let from = Self::guard(order, OrderStatus::Completed)?;

        order.update_payment_status(PaymentStatus::Paid(method));
        order.update_status(OrderStatus::Completed);
        tracing::info!("Order #{}: paid ({}) and completed", order_id, method.code());

        Ok(StatusChange {
            from,
            order: order.clone(),
        })
    }

    /// Flip a paid order to refunded
    pub fn record_refund(&self, order_id: u64) -> Result<Order, OrderError> {
        let mut state = self.state();
        let order = Self::order_mut(&mut state, order_id)?;

        let PaymentStatus::Paid(method) = order.payment_status else {
            return Err(OrderError::NotPaid(order_id));
        };

        order.update_payment_status(PaymentStatus::Refunded(method));
        tracing::info!("Order #{}: payment refunded", order_id);
        Ok(order.clone())
    }

    /// Every order ever created, in id order
    pub fn list_orders(&self) -> Vec<Order> {
        self.state().orders.values().cloned().collect()
    }

    /// Orders not yet completed, in id order
    pub fn list_active_orders(&self) -> Vec<Order> {
        self.state()
            .orders
            .values()
            .filter(|o| o.status != OrderStatus::Completed)
            .cloned()
            .collect()
    }

    pub fn list_orders_for_table(&self, table_number: u32) -> Vec<Order> {
        self.state()
            .orders
            .values()
            .filter(|o| o.table_number == table_number)
            .cloned()
            .collect()
    }

    fn guard(order: &Order, target: OrderStatus) -> Result<OrderStatus, OrderError> {
        if !order.status.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                id: order.id,
                from: order.status,
                to: target,
            });
        }
        Ok(order.status)
    }

    fn order_mut(state: &mut StoreState, order_id: u64) -> Result<&mut Order, OrderError> {
        state
            .orders
            .get_mut(&order_id)
            .ok_or(OrderError::NotFound(order_id))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("Order not found: #{0}")]
    NotFound(u64),

    #[error("Menu item not found: {0}")]
    ItemNotFound(String),

    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(u32),

    #[error("Table number must be positive, got {0}")]
    InvalidTableNumber(u32),

    #[error("Order #{id}: invalid state transition from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        id: u64,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order #{id} cannot be modified in status {}", .status.as_str())]
    NotModifiable { id: u64, status: OrderStatus },

    #[error("Order #{0} has no payment to refund")]
    NotPaid(u64),

    #[error("Menu item {0} has an invalid price")]
    InvalidItemPrice(String),

    #[error("Quantity of {0} would exceed the maximum")]
    QuantityOverflow(String),

    #[error("Order #{0} already has a payment in progress")]
    PaymentInProgress(u64),
}

impl From<CatalogError> for OrderError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(name) => OrderError::ItemNotFound(name),
            CatalogError::NegativePrice { name, .. } => OrderError::InvalidItemPrice(name),
        }
    }
}
