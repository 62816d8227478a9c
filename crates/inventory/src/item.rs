use serde::{Deserialize, Serialize};

use bookshop_core::{AggregateId, AggregateRoot, DomainError, DomainResult};

/// Item identifier.
///
/// Ordered: multi-item operations lock items in ascending id order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub AggregateId);

impl ItemId {
    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// What kind of product an item is. Descriptive only; stock rules are the same
/// for every kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Book { author: String, isbn: String },
    Album { artist: String, etc: String },
    Movie { director: String, actor: String },
}

/// Aggregate root: a sellable item with a stock counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: String,
    /// Price in smallest currency unit.
    price: u64,
    stock_quantity: u64,
    kind: ItemKind,
    version: u64,
}

impl Item {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        price: u64,
        stock_quantity: u64,
        kind: ItemKind,
    ) -> DomainResult<Self> {
        let name = validate_name(name.into())?;
        Ok(Self {
            id,
            name,
            price,
            stock_quantity,
            kind,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn stock_quantity(&self) -> u64 {
        self.stock_quantity
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Take `quantity` units out of stock.
    ///
    /// Stock never goes below zero: asking for more than is on hand fails with
    /// [`DomainError::InsufficientStock`] and leaves the item untouched.
    pub fn reserve(&mut self, quantity: u64) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if quantity > self.stock_quantity {
            return Err(DomainError::insufficient_stock(quantity, self.stock_quantity));
        }
        self.stock_quantity -= quantity;
        self.version += 1;
        Ok(())
    }

    /// Put `quantity` units back into stock. There is no upper bound.
    pub fn release(&mut self, quantity: u64) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        self.stock_quantity = self
            .stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("stock quantity overflow"))?;
        self.version += 1;
        Ok(())
    }

    /// Change catalog details. Stock is deliberately not editable here.
    pub fn update_details(&mut self, name: impl Into<String>, price: u64) -> DomainResult<()> {
        self.name = validate_name(name.into())?;
        self.price = price;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_book(stock: u64) -> Item {
        Item::new(
            ItemId::generate(),
            "JPA Book",
            10_000,
            stock,
            ItemKind::Book {
                author: "Kim".to_string(),
                isbn: "978-89-960777-9-9".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn reserve_decrements_stock_and_bumps_version() {
        let mut item = test_book(10);
        item.reserve(2).unwrap();
        assert_eq!(item.stock_quantity(), 8);
        assert_eq!(item.version(), 1);
    }

    #[test]
    fn reserve_more_than_stock_fails_without_mutation() {
        let mut item = test_book(10);
        let err = item.reserve(11).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                requested: 11,
                available: 10
            }
        );
        assert_eq!(item.stock_quantity(), 10);
        assert_eq!(item.version(), 0);
    }

    #[test]
    fn reserve_exact_stock_drains_to_zero() {
        let mut item = test_book(3);
        item.reserve(3).unwrap();
        assert_eq!(item.stock_quantity(), 0);
        assert!(item.reserve(1).is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut item = test_book(3);
        assert!(matches!(item.reserve(0), Err(DomainError::Validation(_))));
        assert!(matches!(item.release(0), Err(DomainError::Validation(_))));
    }

    #[test]
    fn release_has_no_upper_bound() {
        let mut item = test_book(0);
        item.release(1_000).unwrap();
        assert_eq!(item.stock_quantity(), 1_000);
    }

    #[test]
    fn release_overflow_is_an_invariant_violation() {
        let mut item = test_book(u64::MAX);
        assert!(matches!(
            item.release(1),
            Err(DomainError::InvariantViolation(_))
        ));
        assert_eq!(item.stock_quantity(), u64::MAX);
    }

    #[test]
    fn update_details_keeps_stock() {
        let mut item = test_book(5);
        item.update_details("JPA Book 2nd ed.", 12_000).unwrap();
        assert_eq!(item.name(), "JPA Book 2nd ed.");
        assert_eq!(item.price(), 12_000);
        assert_eq!(item.stock_quantity(), 5);
        assert!(item.update_details(" ", 1).is_err());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Reserve(u64),
        Release(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u64..50).prop_map(Op::Reserve),
            (1u64..50).prop_map(Op::Release),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: stock tracks successful operations exactly and a failed
        /// reserve never changes it.
        #[test]
        fn stock_matches_successful_operations(
            initial in 0u64..100,
            ops in prop::collection::vec(op_strategy(), 0..40)
        ) {
            let mut item = test_book(initial);
            let mut expected = initial;

            for op in ops {
                match op {
                    Op::Reserve(q) => {
                        if item.reserve(q).is_ok() {
                            expected -= q;
                        } else {
                            prop_assert!(q > expected);
                        }
                    }
                    Op::Release(q) => {
                        item.release(q).unwrap();
                        expected += q;
                    }
                }
                prop_assert_eq!(item.stock_quantity(), expected);
            }
        }
    }
}
