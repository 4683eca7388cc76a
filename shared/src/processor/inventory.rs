//! Location inventory count processor
//!
//! Counts are best effort: each item runs inside its own savepoint, a failing
//! item is rolled back and reported while the rest of the batch carries on.

use rust_decimal::Decimal;

use crate::error::{ScanError, ScanResult};
use crate::models::{
    AdjustmentAction, CountItemOutcome, CountSummary, InventoryAdjustment, InventoryCountItem,
    InventoryCountResult, Location, NewLocationScan, ScanType,
};
use crate::store::InventoryStore;
use crate::types::Actor;
use crate::validation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryCountProcessor;

impl InventoryCountProcessor {
    pub fn scan_type(&self) -> ScanType {
        ScanType::InventoryCount
    }

    pub fn validate_location(&self, location: &Location) -> ScanResult<()> {
        if !location.active {
            return Err(ScanError::validation(
                format!("Location {} is archived", location.complete_name),
                format!("Vị trí {} đã ngừng hoạt động", location.complete_name),
            ));
        }
        Ok(())
    }

    pub async fn process<S: InventoryStore + ?Sized>(
        &self,
        store: &mut S,
        location: &Location,
        actor: &Actor,
        items: Vec<InventoryCountItem>,
        note: Option<String>,
    ) -> ScanResult<InventoryCountResult> {
        self.validate_location(location)?;

        let scan = store
            .insert_location_scan(NewLocationScan {
                location_id: location.id,
                user_id: actor.user_id(),
                note,
            })
            .await?;
        let reference = format!("Kiểm kê {}", location.complete_name);

        let mut outcomes = Vec::with_capacity(items.len());
        let mut adjustments = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let savepoint = format!("inventory_item_{}", index);
            store.savepoint(&savepoint).await?;

            match self.apply_item(store, location, item, &reference).await {
                Ok(adjustment) => {
                    store.release_savepoint(&savepoint).await?;
                    tracing::debug!(
                        location_id = location.id,
                        product = %adjustment.product,
                        from = %adjustment.from,
                        to = %adjustment.to,
                        changed = adjustment.changed,
                        "Inventory item applied"
                    );
                    adjustments.push(adjustment.clone());
                    outcomes.push(CountItemOutcome {
                        product_id: item.product_id,
                        success: true,
                        adjustment: Some(adjustment),
                        error: None,
                    });
                }
                Err(err) => {
                    store.rollback_to_savepoint(&savepoint).await?;
                    tracing::warn!(
                        location_id = location.id,
                        product_id = item.product_id,
                        error = %err,
                        "Inventory item skipped"
                    );
                    outcomes.push(CountItemOutcome {
                        product_id: item.product_id,
                        success: false,
                        adjustment: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let summary = CountSummary::from_adjustments(&adjustments);
        store.save_count_summary(scan.id, &summary, &adjustments).await?;

        tracing::info!(
            location_id = location.id,
            location_scan_id = scan.id,
            total_products = summary.total_products,
            products_with_changes = summary.products_with_changes,
            "Inventory count saved"
        );

        Ok(InventoryCountResult {
            location_scan_id: scan.id,
            items: outcomes,
            summary,
        })
    }

    async fn apply_item<S: InventoryStore + ?Sized>(
        &self,
        store: &mut S,
        location: &Location,
        item: &InventoryCountItem,
        reference: &str,
    ) -> ScanResult<InventoryAdjustment> {
        validation::validate_counted_quantity(item.counted_quantity).map_err(|message| {
            ScanError::validation(message, "Số lượng kiểm kê không hợp lệ")
        })?;

        if item.is_new {
            let product = store
                .product_name(item.product_id)
                .await?
                .ok_or_else(|| ScanError::not_found(format!("Product {}", item.product_id)))?;
            let quant = store.create_quant(location.id, item.product_id).await?;
            store.apply_inventory(&quant, item.counted_quantity, reference).await?;

            return Ok(InventoryAdjustment {
                product,
                from: Decimal::ZERO,
                to: item.counted_quantity,
                action: AdjustmentAction::Created,
                changed: true,
            });
        }

        let quant_id = item.quant_id.ok_or_else(|| {
            ScanError::validation(
                format!("Product {} has no stock record in this location", item.product_id),
                format!("Sản phẩm {} chưa có tồn kho tại vị trí này", item.product_id),
            )
        })?;
        let quant = store
            .quant(quant_id)
            .await?
            .ok_or_else(|| ScanError::not_found(format!("Stock record {}", quant_id)))?;

        if quant.location_id != location.id || quant.product_id != item.product_id {
            return Err(ScanError::validation(
                format!("Stock record {} does not match this location and product", quant_id),
                format!("Tồn kho {} không khớp vị trí hoặc sản phẩm", quant_id),
            ));
        }

        if quant.quantity == item.counted_quantity {
            return Ok(InventoryAdjustment {
                product: quant.product_name,
                from: quant.quantity,
                to: item.counted_quantity,
                action: AdjustmentAction::NoChange,
                changed: false,
            });
        }

        store.apply_inventory(&quant, item.counted_quantity, reference).await?;
        Ok(InventoryAdjustment {
            product: quant.product_name.clone(),
            from: quant.quantity,
            to: item.counted_quantity,
            action: AdjustmentAction::Updated,
            changed: true,
        })
    }
}
