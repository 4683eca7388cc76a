//! FIFO reconciliation of confirmed quantities against demand lines
//!
//! An operator confirms one quantity for a group of lines sharing product,
//! unit and location. The quantity is spread over the group's lines in
//! ascending line id order, each line taking at most its demand.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::ScanError;
use crate::models::{ConfirmationRequest, DemandLine, NewConfirmation};

/// Demand of one line taking part in an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDemand {
    pub line_id: i64,
    pub demand: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub line_id: i64,
    pub quantity: Decimal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Confirmed quantity {confirmed} cannot be negative")]
    Negative { confirmed: Decimal },

    #[error("Confirmed quantity {confirmed} exceeds total demand {demand}")]
    ExceedsDemand { confirmed: Decimal, demand: Decimal },

    #[error("A confirmation must name at least one line")]
    EmptyGroup,

    #[error("Line {0} does not belong to this document")]
    UnknownLine(i64),

    #[error("Line {0} is cancelled")]
    CancelledLine(i64),

    #[error("Line {line_id} is not for product {product_id}")]
    ProductMismatch { line_id: i64, product_id: i64 },

    #[error("Line {line_id} would be confirmed {allocated}, above its demand {demand}")]
    LineOverAllocated {
        line_id: i64,
        allocated: Decimal,
        demand: Decimal,
    },
}

impl AllocationError {
    pub fn message_vi(&self) -> String {
        match self {
            AllocationError::Negative { confirmed } => {
                format!("Số lượng xác nhận {} không được âm", confirmed)
            }
            AllocationError::ExceedsDemand { confirmed, demand } => format!(
                "Số lượng xác nhận {} vượt quá tổng nhu cầu {}",
                confirmed, demand
            ),
            AllocationError::EmptyGroup => "Xác nhận phải có ít nhất một dòng hàng".to_string(),
            AllocationError::UnknownLine(id) => format!("Dòng {} không thuộc phiếu này", id),
            AllocationError::CancelledLine(id) => format!("Dòng {} đã bị hủy", id),
            AllocationError::ProductMismatch { line_id, product_id } => {
                format!("Dòng {} không phải sản phẩm {}", line_id, product_id)
            }
            AllocationError::LineOverAllocated {
                line_id,
                allocated,
                demand,
            } => format!(
                "Dòng {} được xác nhận {}, vượt quá nhu cầu {}",
                line_id, allocated, demand
            ),
        }
    }
}

impl From<AllocationError> for ScanError {
    fn from(err: AllocationError) -> Self {
        ScanError::validation(err.to_string(), err.message_vi())
    }
}

/// Spread `confirmed` over `lines` in ascending id order.
///
/// Every distinct line gets an entry, zero allocations included.
pub fn allocate_fifo(lines: &[LineDemand], confirmed: Decimal) -> Result<Vec<Allocation>, AllocationError> {
    if confirmed < Decimal::ZERO {
        return Err(AllocationError::Negative { confirmed });
    }

    let mut ordered = lines.to_vec();
    ordered.sort_by_key(|line| line.line_id);
    ordered.dedup_by_key(|line| line.line_id);

    if ordered.is_empty() {
        return Err(AllocationError::EmptyGroup);
    }

    let demand: Decimal = ordered.iter().map(|line| line.demand).sum();
    if confirmed > demand {
        return Err(AllocationError::ExceedsDemand { confirmed, demand });
    }

    let mut remaining = confirmed;
    let allocations = ordered
        .into_iter()
        .map(|line| {
            let quantity = remaining.min(line.demand).max(Decimal::ZERO);
            remaining -= quantity;
            Allocation {
                line_id: line.line_id,
                quantity,
            }
        })
        .collect();

    Ok(allocations)
}

/// Confirmation row planned for a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedConfirmation {
    pub line_id: i64,
    pub product_id: i64,
    pub quantity: Decimal,
    pub note: Option<String>,
}

/// Everything a reconciliation will write, computed before any write happens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub confirmations: Vec<PlannedConfirmation>,
    /// New `quantity_done` for every line named by a group
    pub quantity_done: BTreeMap<i64, Decimal>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.confirmations.is_empty() && self.quantity_done.is_empty()
    }

    pub fn into_rows(self, scan_history_id: i64) -> (Vec<NewConfirmation>, BTreeMap<i64, Decimal>) {
        let rows = self
            .confirmations
            .into_iter()
            .map(|c| NewConfirmation {
                scan_history_id,
                line_id: c.line_id,
                product_id: c.product_id,
                quantity_confirmed: c.quantity,
                note: c.note,
            })
            .collect();
        (rows, self.quantity_done)
    }
}

/// Validate confirmation requests against a document's lines and plan the writes
pub fn plan_reconciliation(
    lines: &[DemandLine],
    requests: &[ConfirmationRequest],
) -> Result<ReconciliationPlan, AllocationError> {
    let by_id: BTreeMap<i64, &DemandLine> = lines.iter().map(|line| (line.id, line)).collect();
    let mut plan = ReconciliationPlan::default();

    for request in requests {
        let mut group = Vec::with_capacity(request.line_ids.len());
        for line_id in &request.line_ids {
            let line = by_id
                .get(line_id)
                .ok_or(AllocationError::UnknownLine(*line_id))?;
            if line.cancelled {
                return Err(AllocationError::CancelledLine(line.id));
            }
            if let Some(product_id) = request.product_id {
                if line.product_id != product_id {
                    return Err(AllocationError::ProductMismatch {
                        line_id: line.id,
                        product_id,
                    });
                }
            }
            group.push(LineDemand {
                line_id: line.id,
                demand: line.demand_qty,
            });
        }

        for allocation in allocate_fifo(&group, request.confirmed_qty)? {
            let line = by_id[&allocation.line_id];
            let done = plan
                .quantity_done
                .entry(allocation.line_id)
                .or_insert(Decimal::ZERO);
            *done += allocation.quantity;
            if *done > line.demand_qty {
                return Err(AllocationError::LineOverAllocated {
                    line_id: line.id,
                    allocated: *done,
                    demand: line.demand_qty,
                });
            }

            if allocation.quantity > Decimal::ZERO {
                plan.confirmations.push(PlannedConfirmation {
                    line_id: line.id,
                    product_id: line.product_id,
                    quantity: allocation.quantity,
                    note: request.note.clone(),
                });
            }
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demand(line_id: i64, qty: i64) -> LineDemand {
        LineDemand {
            line_id,
            demand: Decimal::from(qty),
        }
    }

    fn quantities(allocations: &[Allocation]) -> Vec<i64> {
        allocations
            .iter()
            .map(|a| a.quantity.try_into().unwrap())
            .collect()
    }

    #[test]
    fn test_fifo_examples() {
        let lines = [demand(2, 6), demand(1, 5)];
        assert_eq!(quantities(&allocate_fifo(&lines, Decimal::from(8)).unwrap()), vec![5, 3]);
        assert_eq!(quantities(&allocate_fifo(&lines, Decimal::from(11)).unwrap()), vec![5, 6]);
        assert_eq!(quantities(&allocate_fifo(&lines, Decimal::from(1)).unwrap()), vec![1, 0]);
    }

    #[test]
    fn test_fifo_rejects_bad_quantities() {
        let lines = [demand(1, 5)];
        assert_eq!(
            allocate_fifo(&lines, Decimal::from(-1)),
            Err(AllocationError::Negative {
                confirmed: Decimal::from(-1)
            })
        );
        assert!(matches!(
            allocate_fifo(&lines, Decimal::from(6)),
            Err(AllocationError::ExceedsDemand { .. })
        ));
        assert_eq!(allocate_fifo(&[], Decimal::ZERO), Err(AllocationError::EmptyGroup));
    }

    #[test]
    fn test_fifo_collapses_duplicate_lines() {
        let lines = [demand(1, 5), demand(1, 5)];
        let allocations = allocate_fifo(&lines, Decimal::from(5)).unwrap();
        assert_eq!(allocations.len(), 1);
        assert!(allocate_fifo(&lines, Decimal::from(6)).is_err());
    }

    #[test]
    fn test_allocation_error_converts_to_validation() {
        let err: ScanError = AllocationError::EmptyGroup.into();
        assert!(matches!(err, ScanError::Validation { .. }));
    }
}
