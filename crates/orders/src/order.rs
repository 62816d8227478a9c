use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookshop_core::{AggregateId, AggregateRoot, DomainError, DomainResult};
use bookshop_inventory::ItemId;
use bookshop_members::{Address, MemberId};

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order status lifecycle: `Placed` → `Cancelled`, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Ready,
    Completed,
}

/// Where and whether an order has been shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub address: Address,
    pub status: DeliveryStatus,
}

/// Order line: item, price at time of order, quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    item_id: ItemId,
    /// Price in smallest currency unit, frozen when the order is placed.
    order_price: u64,
    quantity: u64,
}

impl OrderLine {
    pub fn new(item_id: ItemId, order_price: u64, quantity: u64) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if order_price.checked_mul(quantity).is_none() {
            return Err(DomainError::validation("line subtotal overflows"));
        }
        Ok(Self {
            item_id,
            order_price,
            quantity,
        })
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn order_price(&self) -> u64 {
        self.order_price
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn subtotal(&self) -> u64 {
        // Checked at construction.
        self.order_price * self.quantity
    }
}

/// Aggregate root: Order.
///
/// An order and its lines are one consistency boundary. Orders are never
/// deleted; cancellation is a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    member_id: MemberId,
    ordered_at: DateTime<Utc>,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    delivery: Delivery,
    version: u64,
}

impl Order {
    /// Build a freshly placed order. Stock must already be reserved.
    pub fn place(
        id: OrderId,
        member_id: MemberId,
        delivery_address: Address,
        lines: Vec<OrderLine>,
        ordered_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line"));
        }
        lines
            .iter()
            .try_fold(0u64, |acc, l| acc.checked_add(l.subtotal()))
            .ok_or_else(|| DomainError::validation("order total overflows"))?;

        Ok(Self {
            id,
            member_id,
            ordered_at,
            status: OrderStatus::Placed,
            lines,
            delivery: Delivery {
                address: delivery_address,
                status: DeliveryStatus::Ready,
            },
            version: 0,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Sum of line subtotals.
    pub fn total_price(&self) -> u64 {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }

    pub fn is_cancellable(&self) -> bool {
        self.status == OrderStatus::Placed && self.delivery.status != DeliveryStatus::Completed
    }

    /// Transition `Placed` → `Cancelled`.
    ///
    /// Rejected when the order is already cancelled or its delivery has
    /// completed. The caller releases the lines' stock.
    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status == OrderStatus::Cancelled {
            return Err(DomainError::AlreadyCancelled);
        }
        if self.delivery.status == DeliveryStatus::Completed {
            return Err(DomainError::invariant(
                "cannot cancel an order whose delivery is completed",
            ));
        }
        self.status = OrderStatus::Cancelled;
        self.version += 1;
        Ok(())
    }

    pub fn complete_delivery(&mut self) -> DomainResult<()> {
        if self.status == OrderStatus::Cancelled {
            return Err(DomainError::AlreadyCancelled);
        }
        if self.delivery.status == DeliveryStatus::Completed {
            return Err(DomainError::conflict("delivery already completed"));
        }
        self.delivery.status = DeliveryStatus::Completed;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_address() -> Address {
        Address::new("Seoul", "Hangang-ro", "12345").unwrap()
    }

    fn place_with(lines: Vec<OrderLine>) -> DomainResult<Order> {
        Order::place(
            OrderId::generate(),
            MemberId::generate(),
            test_address(),
            lines,
            Utc::now(),
        )
    }

    fn test_order() -> Order {
        place_with(vec![OrderLine::new(ItemId::generate(), 10_000, 2).unwrap()]).unwrap()
    }

    #[test]
    fn placed_order_starts_ready_for_delivery() {
        let order = test_order();
        assert_eq!(order.status(), OrderStatus::Placed);
        assert_eq!(order.delivery().status, DeliveryStatus::Ready);
        assert_eq!(order.delivery().address, test_address());
        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.total_price(), 20_000);
        assert_eq!(order.version(), 0);
    }

    #[test]
    fn order_without_lines_is_rejected() {
        let err = place_with(vec![]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zero_quantity_line_is_rejected() {
        let err = OrderLine::new(ItemId::generate(), 100, 0).unwrap_err();
        assert_eq!(err, DomainError::validation("quantity must be positive"));
    }

    #[test]
    fn overflowing_totals_are_rejected() {
        assert!(OrderLine::new(ItemId::generate(), u64::MAX, 2).is_err());

        let lines = vec![
            OrderLine::new(ItemId::generate(), u64::MAX, 1).unwrap(),
            OrderLine::new(ItemId::generate(), 1, 1).unwrap(),
        ];
        assert!(place_with(lines).is_err());
    }

    #[test]
    fn cancel_is_one_way() {
        let mut order = test_order();
        order.cancel().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.version(), 1);

        let err = order.cancel().unwrap_err();
        assert_eq!(err, DomainError::AlreadyCancelled);
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn delivered_order_cannot_be_cancelled() {
        let mut order = test_order();
        order.complete_delivery().unwrap();
        assert!(!order.is_cancellable());

        let err = order.cancel().unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("delivery is completed") => {}
            other => panic!("Expected invariant violation, got {other:?}"),
        }
        assert_eq!(order.status(), OrderStatus::Placed);
    }

    #[test]
    fn cancelled_order_cannot_be_delivered() {
        let mut order = test_order();
        order.cancel().unwrap();
        assert_eq!(order.complete_delivery(), Err(DomainError::AlreadyCancelled));
        assert_eq!(order.delivery().status, DeliveryStatus::Ready);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: total price is the sum of price × quantity over all lines.
        #[test]
        fn total_is_sum_of_subtotals(
            raw in prop::collection::vec((0u64..100_000, 1u64..100), 1..10)
        ) {
            let expected: u64 = raw.iter().map(|(p, q)| p * q).sum();
            let lines = raw
                .into_iter()
                .map(|(p, q)| OrderLine::new(ItemId::generate(), p, q).unwrap())
                .collect();
            let order = place_with(lines).unwrap();
            prop_assert_eq!(order.total_price(), expected);
        }
    }
}
