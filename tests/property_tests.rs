//! Property-based tests for allocation, soft-delete filtering and over-receipt checks.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use procurement_core::{
    allocate, allocate_balanced, check_receipt_line, filter_removed, holdback_amount,
    is_over_received, proportional_share, round_currency, OrderLineItem, ReceiptNoteItem,
    RemovedItem,
};
use proptest::prelude::*;

fn cents(value: i64) -> BigDecimal {
    BigDecimal::new(value.into(), 2)
}

fn amount_strategy() -> impl Strategy<Value = BigDecimal> {
    (0i64..100_000_000).prop_map(cents)
}

fn subtotals_strategy() -> impl Strategy<Value = Vec<BigDecimal>> {
    prop::collection::vec((1i64..10_000_000).prop_map(cents), 1..12)
}

fn quantity_strategy() -> impl Strategy<Value = BigDecimal> {
    (0i64..1_000_000).prop_map(|thousandths| BigDecimal::new(thousandths.into(), 3))
}

fn line(uuid: &str) -> OrderLineItem {
    OrderLineItem {
        item_uuid: Some(uuid.to_string()),
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn allocated_shares_stay_within_half_a_cent_per_line(
        total in amount_strategy(),
        subtotals in subtotals_strategy(),
    ) {
        let shares = allocate(&total, &subtotals);
        prop_assert_eq!(shares.len(), subtotals.len());

        let allocated: BigDecimal = shares.iter().sum();
        let tolerance = BigDecimal::new(5.into(), 3) * BigDecimal::from(subtotals.len() as i64);
        prop_assert!((allocated - &total).abs() <= tolerance);
    }

    #[test]
    fn balanced_shares_add_up_exactly(
        total in amount_strategy(),
        subtotals in subtotals_strategy(),
    ) {
        let shares = allocate_balanced(&total, &subtotals);
        let allocated: BigDecimal = shares.iter().sum();
        prop_assert_eq!(allocated, round_currency(&total));
    }

    #[test]
    fn zero_document_subtotal_allocates_nothing(
        total in amount_strategy(),
        lines in 1usize..10,
    ) {
        let subtotals = vec![BigDecimal::from(0); lines];
        for share in allocate_balanced(&total, &subtotals) {
            prop_assert_eq!(share, BigDecimal::from(0));
        }
        prop_assert_eq!(
            proportional_share(&total, &BigDecimal::from(0), &BigDecimal::from(0)),
            BigDecimal::from(0)
        );
    }

    #[test]
    fn holdback_never_exceeds_invoice_total(
        total in amount_strategy(),
        percentage in 0i64..=100,
    ) {
        let holdback = holdback_amount(&total, &BigDecimal::from(percentage));
        prop_assert!(holdback >= BigDecimal::from(0));
        prop_assert!(holdback <= round_currency(&total));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn filtering_removed_items_is_idempotent(
        ids in prop::collection::vec("[a-f]{1,3}", 0..20),
        removed in prop::collection::vec("[A-Fa-f]{1,3}", 0..8),
    ) {
        let items: Vec<OrderLineItem> = ids.iter().map(|id| line(id)).collect();
        let manifest: Vec<RemovedItem> =
            removed.iter().map(|id| RemovedItem::now(id.as_str())).collect();

        let once = filter_removed(items, &manifest);
        let twice = filter_removed(once.clone(), &manifest);
        prop_assert_eq!(&once, &twice);

        for item in &once {
            let uuid = item.item_uuid.as_deref().unwrap_or_default();
            prop_assert!(!removed.iter().any(|id| id.eq_ignore_ascii_case(uuid)));
        }
    }

    #[test]
    fn over_receipt_matches_quantity_comparison(
        ordered in quantity_strategy(),
        received in quantity_strategy(),
        used in quantity_strategy(),
    ) {
        let expected = ordered > BigDecimal::from(0) && received > ordered;
        prop_assert_eq!(is_over_received(Some(&ordered), Some(&received)), expected);

        let item = ReceiptNoteItem {
            item_uuid: Some("line-1".to_string()),
            ordered_quantity: Some(ordered.clone()),
            received_quantity: Some(received.clone()),
            ..Default::default()
        };
        let mut used_quantities = HashMap::new();
        used_quantities.insert("line-1".to_string(), used.clone());

        let check = check_receipt_line(&item, &used_quantities);
        let consumed = &received + &used;
        prop_assert_eq!(
            check.is_over_received,
            ordered > BigDecimal::from(0) && consumed > ordered
        );
        prop_assert!(check.remaining_quantity.unwrap() >= BigDecimal::from(0));
    }
}
