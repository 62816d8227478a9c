//! Order placement and cancellation.
//!
//! ```text
//! place_order                          cancel_order
//!   validate request                     lock order
//!   load member                          load order, transition to Cancelled
//!   lock items (ascending id)            lock its items (ascending id)
//!   reserve each line ──fail──┐          release each line
//!   build + stage order       │          stage order
//!   commit                    │          commit
//!                          rollback
//! ```
//!
//! Every step stages into one [`UnitOfWork`]; nothing is visible to other
//! callers until the final commit, and any failure leaves stock exactly as it
//! was before the call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use bookshop_inventory::ItemId;
use bookshop_members::MemberId;
use bookshop_orders::{DeliveryStatus, Order, OrderId, OrderLine, OrderSearch, OrderStatus};

use crate::error::ShopError;
use crate::ledger::InventoryLedger;
use crate::locks::{KeyedLocks, LockStrategy};
use crate::store::{ShopStore, UnitOfWork};

/// Coordinates the order aggregate with stock reservations.
pub struct OrderCoordinator<S> {
    ledger: InventoryLedger<S>,
    order_locks: KeyedLocks<OrderId>,
}

impl<S: ShopStore> OrderCoordinator<S> {
    pub fn new(ledger: InventoryLedger<S>) -> Self {
        Self {
            ledger,
            order_locks: KeyedLocks::new(LockStrategy::PerKey),
        }
    }

    pub fn ledger(&self) -> &InventoryLedger<S> {
        &self.ledger
    }

    fn store(&self) -> &Arc<S> {
        self.ledger.store()
    }

    /// Place an order for `member_id` and reserve stock for every line.
    ///
    /// All-or-nothing: if any line cannot be reserved, the reservations
    /// staged so far in this call are discarded with the unit of work and the
    /// error is returned.
    #[instrument(skip_all, fields(%member_id, lines = lines.len()))]
    pub fn place_order(
        &self,
        member_id: MemberId,
        lines: &[(ItemId, u64)],
    ) -> Result<OrderId, ShopError> {
        if lines.is_empty() {
            return Err(ShopError::Validation(
                "order must have at least one line".to_string(),
            ));
        }
        if let Some((item_id, _)) = lines.iter().find(|(_, q)| *q == 0) {
            return Err(ShopError::Validation(format!(
                "quantity for item {item_id} must be positive"
            )));
        }

        let member = self
            .store()
            .load_member(member_id)?
            .ok_or(ShopError::MemberNotFound(member_id))?;

        let _items = self.ledger.locks().lock_all(lines.iter().map(|(id, _)| *id));
        let mut uow = UnitOfWork::begin(self.store().as_ref());

        let order_lines = match self.reserve_lines(&mut uow, lines) {
            Ok(order_lines) => order_lines,
            Err(err) => {
                warn!(staged = uow.pending(), %err, "discarding partial reservations");
                uow.rollback();
                return Err(err);
            }
        };

        let order = Order::place(
            OrderId::generate(),
            member_id,
            member.address().clone(),
            order_lines,
            Utc::now(),
        )?;
        let order_id = order.id_typed();
        let total = order.total_price();
        uow.stage_order(order);
        uow.commit()?;

        info!(%order_id, total, "order placed");
        Ok(order_id)
    }

    /// Reserve every line in order, stopping at the first failure.
    fn reserve_lines(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        lines: &[(ItemId, u64)],
    ) -> Result<Vec<OrderLine>, ShopError> {
        lines
            .iter()
            .map(|&(item_id, quantity)| -> Result<OrderLine, ShopError> {
                let item = self.ledger.reserve_in(uow, item_id, quantity)?;
                Ok(OrderLine::new(item_id, item.price(), quantity)?)
            })
            .collect()
    }

    /// Cancel a placed order and put its stock back.
    #[instrument(skip_all, fields(%order_id))]
    pub fn cancel_order(&self, order_id: OrderId) -> Result<(), ShopError> {
        let _order = self.order_locks.lock(order_id);
        let mut uow = UnitOfWork::begin(self.store().as_ref());

        let mut order = uow
            .load_order(order_id)?
            .ok_or(ShopError::OrderNotFound(order_id))?;

        if order.status() == OrderStatus::Placed
            && order.delivery().status == DeliveryStatus::Completed
        {
            return Err(ShopError::DeliveryCompleted(order_id));
        }
        order
            .cancel()
            .map_err(|e| ShopError::for_order(order_id, e))?;

        let _items = self
            .ledger
            .locks()
            .lock_all(order.lines().iter().map(|l| l.item_id()));
        for line in order.lines() {
            self.ledger
                .release_in(&mut uow, line.item_id(), line.quantity())?;
        }

        uow.stage_order(order);
        uow.commit()?;

        info!(%order_id, "order cancelled");
        Ok(())
    }

    /// Mark a placed order as delivered. Delivered orders can no longer be
    /// cancelled.
    #[instrument(skip_all, fields(%order_id))]
    pub fn complete_delivery(&self, order_id: OrderId) -> Result<(), ShopError> {
        let _order = self.order_locks.lock(order_id);
        let mut uow = UnitOfWork::begin(self.store().as_ref());

        let mut order = uow
            .load_order(order_id)?
            .ok_or(ShopError::OrderNotFound(order_id))?;
        order
            .complete_delivery()
            .map_err(|e| ShopError::for_order(order_id, e))?;

        uow.stage_order(order);
        uow.commit()?;

        info!(%order_id, "delivery completed");
        Ok(())
    }

    pub fn find_order(&self, order_id: OrderId) -> Result<Order, ShopError> {
        self.store()
            .load_order(order_id)?
            .ok_or(ShopError::OrderNotFound(order_id))
    }

    /// Orders matching `search`, newest first.
    pub fn search_orders(&self, search: &OrderSearch) -> Result<Vec<Order>, ShopError> {
        let mut names: HashMap<MemberId, String> = HashMap::new();
        let mut found = Vec::new();

        for order in self.store().list_orders()? {
            let member_id = order.member_id();
            if !names.contains_key(&member_id) {
                let name = self
                    .store()
                    .load_member(member_id)?
                    .map(|m| m.name().to_string())
                    .unwrap_or_default();
                names.insert(member_id, name);
            }
            let name = names.get(&member_id).map(String::as_str).unwrap_or("");
            if search.matches(&order, name) {
                found.push(order);
            }
        }

        found.sort_by(|a, b| {
            b.ordered_at()
                .cmp(&a.ordered_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(found)
    }
}
