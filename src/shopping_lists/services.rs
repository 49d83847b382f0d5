use crate::claude::types::ShoppingItem;

/// Flips one item's `purchased` flag. False when `index` is out of range.
pub fn set_item_purchased(items: &mut [ShoppingItem], index: usize, purchased: bool) -> bool {
    match items.get_mut(index) {
        Some(item) => {
            item.purchased = purchased;
            true
        }
        None => false,
    }
}

pub fn list_name(plan_name: &str) -> String {
    format!("Shopping list: {plan_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, category: &str) -> ShoppingItem {
        ShoppingItem {
            item: name.into(),
            quantity: "1".into(),
            category: category.into(),
            purchased: false,
        }
    }

    #[test]
    fn toggles_only_the_indexed_item() {
        let mut items = vec![item("onion", "Produce"), item("rice", "Pantry"), item("tofu", "Protein")];
        let before = items.clone();
        assert!(set_item_purchased(&mut items, 1, true));

        assert!(items[1].purchased);
        assert_eq!(items[1].item, before[1].item);
        assert_eq!(items[1].quantity, before[1].quantity);
        assert_eq!(items[1].category, before[1].category);
        assert_eq!(items[0], before[0]);
        assert_eq!(items[2], before[2]);

        assert!(set_item_purchased(&mut items, 1, false));
        assert_eq!(items, before);
    }

    #[test]
    fn out_of_range_leaves_items_alone() {
        let mut items = vec![item("onion", "Produce")];
        assert!(!set_item_purchased(&mut items, 1, true));
        assert!(!items[0].purchased);
    }
}
