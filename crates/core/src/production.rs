//! Production dates

use jiff::{ToSpan, civil::Date};

use crate::items::CartItem;

/// Anything with a shelf life measured in whole days.
pub trait ShelfLife {
    /// Days the item stays good after production.
    fn shelf_life_days(&self) -> u32;
}

impl ShelfLife for CartItem {
    fn shelf_life_days(&self) -> u32 {
        self.shelf_life_days
    }
}

impl ShelfLife for u32 {
    fn shelf_life_days(&self) -> u32 {
        *self
    }
}

/// The latest date the whole order can be produced on.
///
/// Every item in an order is prepared and shipped together, so the most perishable item bounds the
/// date. Returns `None` when there is no delivery date or no items.
pub fn compute_production_date<T: ShelfLife>(
    delivery_date: Option<Date>,
    items: &[T],
) -> Option<Date> {
    let delivery_date = delivery_date?;
    let shortest = items.iter().map(ShelfLife::shelf_life_days).min()?;

    delivery_date.checked_sub(i64::from(shortest).days()).ok()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use proptest::prelude::*;

    use crate::items::{CartItem, ItemId};

    use super::*;

    #[test]
    fn shortest_shelf_life_bounds_production() {
        let items = [
            CartItem::meal(ItemId::from("soup"), "Soup", 450, 1, 5),
            CartItem::meal(ItemId::from("salad"), "Salad", 550, 2, 2),
            CartItem::meal(ItemId::from("stew"), "Stew", 650, 1, 7),
        ];

        assert_eq!(
            compute_production_date(Some(date(2026, 10, 20)), &items),
            Some(date(2026, 10, 18))
        );
    }

    #[test]
    fn production_crosses_month_boundaries() {
        assert_eq!(
            compute_production_date(Some(date(2026, 11, 2)), &[4_u32]),
            Some(date(2026, 10, 29))
        );
    }

    #[test]
    fn zero_shelf_life_produces_on_delivery_day() {
        assert_eq!(
            compute_production_date(Some(date(2026, 10, 20)), &[0_u32, 3]),
            Some(date(2026, 10, 20))
        );
    }

    #[test]
    fn no_items_or_no_date_gives_none() {
        let none: [u32; 0] = [];

        assert_eq!(compute_production_date(Some(date(2026, 10, 20)), &none), None);
        assert_eq!(compute_production_date(None, &[3_u32]), None);
    }

    proptest! {
        #[test]
        fn longer_shelf_life_never_moves_production_later(
            day in 0_i32..3650,
            mut lives in proptest::collection::vec(0_u32..60, 1..8),
            index in any::<prop::sample::Index>(),
            extra in 0_u32..30,
        ) {
            let delivery = date(2026, 1, 1).checked_add(day.days()).ok();
            let before = compute_production_date(delivery, &lives);

            let slot = index.index(lives.len());
            if let Some(life) = lives.get_mut(slot) {
                *life += extra;
            }

            let after = compute_production_date(delivery, &lives);

            prop_assert!(after.is_some());
            prop_assert!(after <= before, "{after:?} is later than {before:?}");
        }
    }
}
