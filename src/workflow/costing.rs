//! Requisition cost arithmetic.
//!
//! Every item total is `quantity x unit_price` and a requisition's estimated
//! cost is the sum of its item totals. Totals are always derived here, never
//! taken from input.

use rust_decimal::Decimal;

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{Requisition, RequisitionItem};

/// Computes `quantity x unit_price`.
///
/// # Examples
///
/// ```
/// use office_workflow::workflow::line_total;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let total = line_total(3, Decimal::from_str("45.50").unwrap()).unwrap();
/// assert_eq!(total, Decimal::from_str("136.50").unwrap());
/// ```
pub fn line_total(quantity: u32, unit_price: Decimal) -> WorkflowResult<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or_else(|| WorkflowError::validation("unit_price", "line total overflows"))
}

/// Sums the totals of `items`, recomputing each from quantity and unit price.
pub fn estimated_cost(items: &[RequisitionItem]) -> WorkflowResult<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| {
        let total = line_total(item.quantity, item.unit_price)?;
        acc.checked_add(total)
            .ok_or_else(|| WorkflowError::validation("items", "estimated cost overflows"))
    })
}

/// Validates items and fills in their totals.
pub fn price_items(items: Vec<RequisitionItem>) -> WorkflowResult<Vec<RequisitionItem>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, mut item)| {
            item.name = item.name.trim().to_string();
            if item.name.is_empty() {
                return Err(WorkflowError::validation(
                    format!("items[{}].name", index),
                    "must not be empty",
                ));
            }
            if item.quantity == 0 {
                return Err(WorkflowError::validation(
                    format!("items[{}].quantity", index),
                    "must be at least 1",
                ));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(WorkflowError::validation(
                    format!("items[{}].unit_price", index),
                    "must not be negative",
                ));
            }
            item.total_price = line_total(item.quantity, item.unit_price)?;
            Ok(item)
        })
        .collect()
}

/// Restores both cost invariants on a requisition.
pub fn recalculate(requisition: &mut Requisition) -> WorkflowResult<()> {
    for item in &mut requisition.items {
        item.total_price = line_total(item.quantity, item.unit_price)?;
    }
    requisition.estimated_cost = estimated_cost(&requisition.items)?;
    Ok(())
}
