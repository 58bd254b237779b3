//! Proportional distribution of document-level adjustments over line items

use bigdecimal::{BigDecimal, RoundingMode};

use crate::types::ReceiptNoteItem;

/// Round a monetary value to cents, halves toward positive infinity
///
/// Matches `round(value * 100) / 100`: `1.005` becomes `1.01` and `-1.005`
/// becomes `-1.00`.
pub fn round_currency(value: &BigDecimal) -> BigDecimal {
    let mode = if *value < BigDecimal::from(0) {
        RoundingMode::HalfDown
    } else {
        RoundingMode::HalfUp
    };
    value.with_scale_round(2, mode)
}

/// `total * line_subtotal / document_subtotal`, rounded to cents
///
/// A zero document subtotal yields a zero share.
pub fn proportional_share(
    total: &BigDecimal,
    line_subtotal: &BigDecimal,
    document_subtotal: &BigDecimal,
) -> BigDecimal {
    if *document_subtotal == BigDecimal::from(0) {
        return BigDecimal::from(0);
    }
    round_currency(&((total * line_subtotal) / document_subtotal))
}

/// Split `total` across lines by their share of the summed subtotals
///
/// Each share is rounded on its own, so the shares may differ from `total` by
/// up to half a cent per line.
pub fn allocate(total: &BigDecimal, line_subtotals: &[BigDecimal]) -> Vec<BigDecimal> {
    let document_subtotal: BigDecimal = line_subtotals.iter().sum();
    line_subtotals
        .iter()
        .map(|line| proportional_share(total, line, &document_subtotal))
        .collect()
}

/// Like [`allocate`], with the rounding residue pushed onto the largest line
/// so the shares add up to the rounded total exactly
pub fn allocate_balanced(total: &BigDecimal, line_subtotals: &[BigDecimal]) -> Vec<BigDecimal> {
    let mut shares = allocate(total, line_subtotals);
    let document_subtotal: BigDecimal = line_subtotals.iter().sum();
    if document_subtotal == BigDecimal::from(0) {
        return shares;
    }

    let allocated: BigDecimal = shares.iter().sum();
    let residue = round_currency(total) - allocated;
    if residue == BigDecimal::from(0) {
        return shares;
    }

    let largest = line_subtotals
        .iter()
        .enumerate()
        .fold(None::<(usize, &BigDecimal)>, |best, (index, line)| match best {
            Some((_, current)) if current.abs() >= line.abs() => best,
            _ => Some((index, line)),
        })
        .map(|(index, _)| index);

    if let Some(index) = largest {
        shares[index] += residue;
    }
    shares
}

/// Holdback withheld from an invoice total; zero unless the percentage is positive
pub fn holdback_amount(total_invoice_amount: &BigDecimal, percentage: &BigDecimal) -> BigDecimal {
    if *percentage <= BigDecimal::from(0) {
        return BigDecimal::from(0);
    }
    round_currency(&((total_invoice_amount * percentage) / BigDecimal::from(100)))
}

/// Total to show for a receipt line
///
/// Uses the first available of `grn_total_with_charges_taxes`, `grn_total`,
/// `received_total`, then `unit_price * received_quantity`.
pub fn display_total(item: &ReceiptNoteItem) -> BigDecimal {
    if let Some(total) = item
        .grn_total_with_charges_taxes
        .as_ref()
        .or(item.grn_total.as_ref())
        .or(item.received_total.as_ref())
    {
        return total.clone();
    }
    match (&item.unit_price, &item.received_quantity) {
        (Some(price), Some(quantity)) => round_currency(&(price * quantity)),
        _ => BigDecimal::from(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_round_currency_half_up() {
        assert_eq!(round_currency(&dec("1.005")), dec("1.01"));
        assert_eq!(round_currency(&dec("1.004")), dec("1.00"));
        assert_eq!(round_currency(&dec("2.675")), dec("2.68"));
    }

    #[test]
    fn test_round_currency_negative_halves_go_up() {
        assert_eq!(round_currency(&dec("-1.005")), dec("-1.00"));
        assert_eq!(round_currency(&dec("-1.006")), dec("-1.01"));
        assert_eq!(round_currency(&dec("-1.004")), dec("-1.00"));
        assert_eq!(round_currency(&dec("-0.125")), dec("-0.12"));
    }

    #[test]
    fn test_allocate_by_subtotal_share() {
        let shares = allocate(&dec("30"), &[dec("100"), dec("200")]);
        assert_eq!(shares, vec![dec("10"), dec("20")]);
    }

    #[test]
    fn test_allocate_zero_subtotal() {
        let shares = allocate(&dec("50"), &[dec("0"), dec("0")]);
        assert_eq!(shares, vec![dec("0"), dec("0")]);
        assert!(allocate(&dec("50"), &[]).is_empty());
    }

    #[test]
    fn test_allocate_balanced_absorbs_residue() {
        let lines = [dec("1"), dec("1"), dec("1")];
        let plain = allocate(&dec("10"), &lines);
        assert_eq!(plain.iter().sum::<BigDecimal>(), dec("9.99"));

        let balanced = allocate_balanced(&dec("10"), &lines);
        assert_eq!(balanced.iter().sum::<BigDecimal>(), dec("10"));
        assert_eq!(balanced[0], dec("3.34"));
    }

    #[test]
    fn test_holdback_amount() {
        assert_eq!(holdback_amount(&dec("1000"), &dec("10")), dec("100"));
        assert_eq!(holdback_amount(&dec("333.33"), &dec("5")), dec("16.67"));
        assert_eq!(holdback_amount(&dec("1000"), &dec("0")), dec("0"));
        assert_eq!(holdback_amount(&dec("1000"), &dec("-5")), dec("0"));
    }

    #[test]
    fn test_display_total_prefers_grn_with_charges_taxes() {
        let item = ReceiptNoteItem {
            grn_total_with_charges_taxes: Some(dec("550")),
            received_total: Some(dec("500")),
            ..Default::default()
        };
        assert_eq!(display_total(&item), dec("550"));
    }

    #[test]
    fn test_display_total_fallback_chain() {
        let mut item = ReceiptNoteItem {
            unit_price: Some(dec("100")),
            received_quantity: Some(dec("3")),
            ..Default::default()
        };
        assert_eq!(display_total(&item), dec("300"));

        item.received_total = Some(dec("290"));
        assert_eq!(display_total(&item), dec("290"));

        item.grn_total = Some(dec("310"));
        assert_eq!(display_total(&item), dec("310"));
    }
}
