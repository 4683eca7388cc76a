//! Scan processors
//!
//! A document scan always runs the same steps in the same order:
//!
//! 1. `validate_state`: closed documents accept no scans
//! 2. `validate_specific`: per scan type preconditions, plus planning of the
//!    quantity reconciliation so that over-confirmation fails here
//! 3. `create_scan_history`: append the ledger entry
//! 4. `process_images`
//! 5. `process_additional_data`: write the reconciliation
//! 6. `auto_validate`: finalize the document when enabled
//!
//! Steps 1 and 2 only read, so a rejected scan leaves no trace.

mod inventory;

pub use inventory::InventoryCountProcessor;

use crate::allocation::{plan_reconciliation, ReconciliationPlan};
use crate::error::{ScanError, ScanResult};
use crate::ledger::{self, WorkflowStatus};
use crate::models::{
    Attachment, ConfirmationEntry, DemandLine, Document, DocumentKind, NewScanEntry, ScanHistoryEntry,
    ScanOutcome, ScanParams, ScanType, ShippingInfo, ShippingType,
};
use crate::store::ScanStore;
use crate::types::Actor;
use crate::validation;

/// What a scan is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSubject {
    Transfer,
    PurchaseIntake,
    Location,
}

impl From<DocumentKind> for ScanSubject {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Transfer => ScanSubject::Transfer,
            DocumentKind::PurchaseIntake => ScanSubject::PurchaseIntake,
        }
    }
}

/// Processor resolved for a (subject, scan type) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processor {
    Document(ScanProcessor),
    InventoryCount(InventoryCountProcessor),
}

pub struct ProcessorFactory;

impl ProcessorFactory {
    pub fn resolve(subject: ScanSubject, scan_type: ScanType) -> ScanResult<Processor> {
        let processor = match (subject, scan_type) {
            (ScanSubject::Transfer, ScanType::Prepare) => Processor::Document(ScanProcessor::Prepare),
            (ScanSubject::Transfer, ScanType::Shipping) => Processor::Document(ScanProcessor::Shipping),
            (ScanSubject::Transfer | ScanSubject::PurchaseIntake, ScanType::Receive) => {
                Processor::Document(ScanProcessor::Receive)
            }
            (ScanSubject::Transfer | ScanSubject::PurchaseIntake, ScanType::Checking) => {
                Processor::Document(ScanProcessor::Checking)
            }
            (ScanSubject::Location, ScanType::InventoryCount) => {
                Processor::InventoryCount(InventoryCountProcessor)
            }
            (_, scan_type) => return Err(unsupported(scan_type)),
        };
        Ok(processor)
    }
}

fn unsupported(scan_type: ScanType) -> ScanError {
    ScanError::validation(
        format!("Unsupported scan type: {}", scan_type),
        format!("Không hỗ trợ loại scan: {}", scan_type),
    )
}

/// Document scan processor variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanProcessor {
    Prepare,
    Shipping,
    Receive,
    Checking,
}

impl ScanProcessor {
    /// Resolve the processor for a document scan
    pub fn for_document(kind: DocumentKind, scan_type: ScanType) -> ScanResult<Self> {
        match ProcessorFactory::resolve(kind.into(), scan_type)? {
            Processor::Document(processor) => Ok(processor),
            Processor::InventoryCount(_) => Err(unsupported(scan_type)),
        }
    }

    pub fn scan_type(&self) -> ScanType {
        match self {
            ScanProcessor::Prepare => ScanType::Prepare,
            ScanProcessor::Shipping => ScanType::Shipping,
            ScanProcessor::Receive => ScanType::Receive,
            ScanProcessor::Checking => ScanType::Checking,
        }
    }

    /// Whether confirmed quantities are reconciled against demand
    pub fn reconciles_quantities(&self) -> bool {
        !matches!(self, ScanProcessor::Receive)
    }

    /// Finalize default when the caller does not say otherwise
    pub fn auto_validate_default(&self) -> bool {
        matches!(self, ScanProcessor::Shipping | ScanProcessor::Checking)
    }

    pub fn validate_state(&self, document: &Document) -> ScanResult<()> {
        if document.state.is_closed() {
            return Err(ScanError::validation(
                format!("Cannot scan a document in state '{}'", document.state),
                format!("Không thể quét QR cho phiếu có trạng thái '{}'", document.state),
            ));
        }
        Ok(())
    }

    /// Per-variant preconditions. Returns the reconciliation to apply later.
    pub fn validate_specific(
        &self,
        document: &Document,
        lines: &[DemandLine],
        history: &[ScanHistoryEntry],
        actor: &Actor,
        params: &ScanParams,
    ) -> ScanResult<ReconciliationPlan> {
        match self {
            ScanProcessor::Prepare => {
                if !lines.iter().any(|line| !line.cancelled) {
                    return Err(ScanError::validation(
                        "Cannot confirm: this document has no products to prepare",
                        "Không thể xác nhận: Phiếu này không có sản phẩm để chuẩn bị!",
                    ));
                }
                let (resource, action) = Actor::STOCK_OPERATE;
                if !actor.has_permission(resource, action) {
                    return Err(ScanError::permission_denied(resource, action));
                }
            }
            ScanProcessor::Shipping => {
                let shipping_type = params.shipping_type.ok_or_else(|| {
                    ScanError::validation("Please choose a shipping type", "Vui lòng chọn loại vận chuyển!")
                })?;
                if shipping_type != ShippingType::ValidateOnly {
                    if let Some(phone) = params.shipping_phone.as_deref().filter(|p| !p.trim().is_empty()) {
                        validation::validate_vietnamese_phone(phone).map_err(|_| {
                            ScanError::validation(
                                "Invalid shipping contact phone number",
                                "Số điện thoại vận chuyển không hợp lệ",
                            )
                        })?;
                    }
                }
                if ledger::is_shipped(history) {
                    return Err(ScanError::validation(
                        "This delivery has already been shipped",
                        "Phiếu xuất kho này đã được vận chuyển rồi!",
                    ));
                }
                if !ledger::is_prepared(history) {
                    return Err(ScanError::validation(
                        "Goods must be prepared before shipping",
                        "Phải chuẩn bị hàng trước khi vận chuyển!",
                    ));
                }
            }
            ScanProcessor::Receive => {
                if ledger::is_received(history) {
                    return Err(ScanError::validation(
                        "This receipt has already been received",
                        "Phiếu nhập kho này đã được nhận hàng rồi!",
                    ));
                }
                if !document.is_inbound() {
                    return Err(ScanError::validation(
                        "Only incoming documents can be received",
                        "Chỉ có thể nhận hàng cho phiếu nhập kho!",
                    ));
                }
            }
            ScanProcessor::Checking => {
                if !ledger::is_received(history) {
                    return Err(ScanError::validation(
                        "Goods can only be checked after they are received",
                        "Chỉ có thể kiểm hàng sau khi đã nhận hàng!",
                    ));
                }
            }
        }

        if !self.reconciles_quantities() || params.confirmations.is_empty() {
            return Ok(ReconciliationPlan::default());
        }
        Ok(plan_reconciliation(lines, &params.confirmations)?)
    }

    pub async fn create_scan_history<S: ScanStore + ?Sized>(
        &self,
        store: &mut S,
        document: &Document,
        actor: &Actor,
        params: &ScanParams,
    ) -> ScanResult<ScanHistoryEntry> {
        let shipping = match (self, params.shipping_type) {
            (ScanProcessor::Shipping, Some(shipping_type)) if shipping_type != ShippingType::ValidateOnly => {
                Some(ShippingInfo {
                    shipping_type,
                    phone: params.shipping_phone.clone(),
                    company: params.shipping_company.clone(),
                })
            }
            _ => None,
        };

        store
            .insert_scan_entry(NewScanEntry {
                document_id: document.id,
                scan_type: self.scan_type(),
                user_id: actor.user_id(),
                note: params.note.clone(),
                shipping,
            })
            .await
    }

    /// Attach uploaded images. Missing or empty image lists do nothing.
    pub async fn process_images<S: ScanStore + ?Sized>(
        &self,
        store: &mut S,
        entry: &ScanHistoryEntry,
        params: &ScanParams,
    ) -> ScanResult<Vec<Attachment>> {
        match params.images.as_deref() {
            Some(images) if !images.is_empty() => store.attach_images(entry.id, images).await,
            _ => Ok(Vec::new()),
        }
    }

    pub async fn process_additional_data<S: ScanStore + ?Sized>(
        &self,
        store: &mut S,
        entry: &ScanHistoryEntry,
        actor: &Actor,
        plan: ReconciliationPlan,
    ) -> ScanResult<Vec<ConfirmationEntry>> {
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        let (rows, quantity_done) = plan.into_rows(entry.id);
        let confirmations = if rows.is_empty() {
            Vec::new()
        } else {
            store.insert_confirmations(rows, actor.user_id()).await?
        };
        store.set_quantity_done(&quantity_done).await?;

        tracing::debug!(
            scan_history_id = entry.id,
            rows = confirmations.len(),
            lines = quantity_done.len(),
            "Reconciled confirmed quantities"
        );
        Ok(confirmations)
    }

    /// Finalize the document when enabled. Returns whether it was finalized.
    pub async fn auto_validate<S: ScanStore + ?Sized>(
        &self,
        store: &mut S,
        document: &Document,
        actor: &Actor,
        params: &ScanParams,
    ) -> ScanResult<bool> {
        let enabled = params.auto_validate.unwrap_or_else(|| self.auto_validate_default());
        if !enabled || document.state.is_closed() {
            return Ok(false);
        }

        store.finalize_document(document.id, actor).await?;
        tracing::info!(
            document_id = document.id,
            scan_type = %self.scan_type(),
            system = actor.is_system(),
            "Document finalized after scan"
        );
        Ok(true)
    }

    /// Run every step for one scan.
    ///
    /// Must be called inside the host transaction; errors leave the caller
    /// responsible for rolling it back.
    pub async fn process_scan<S: ScanStore + ?Sized>(
        &self,
        store: &mut S,
        document: &Document,
        actor: &Actor,
        params: ScanParams,
    ) -> ScanResult<ScanOutcome> {
        self.validate_state(document)?;

        let mut history = store.scan_history(document.id).await?;
        let lines = store.demand_lines(document.id).await?;
        let plan = self.validate_specific(document, &lines, &history, actor, &params)?;

        let entry = self.create_scan_history(store, document, actor, &params).await?;
        let attachments = self.process_images(store, &entry, &params).await?;
        let confirmations = self.process_additional_data(store, &entry, actor, plan).await?;
        let finalized = self.auto_validate(store, document, actor, &params).await?;

        history.push(entry.clone());
        tracing::info!(
            document_id = document.id,
            scan_history_id = entry.id,
            scan_type = %self.scan_type(),
            finalized,
            "Scan recorded"
        );

        Ok(ScanOutcome {
            status: WorkflowStatus::from_history(&history),
            entry,
            attachments,
            confirmations,
            finalized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_table() {
        assert_eq!(
            ProcessorFactory::resolve(ScanSubject::Transfer, ScanType::Prepare),
            Ok(Processor::Document(ScanProcessor::Prepare))
        );
        assert_eq!(
            ProcessorFactory::resolve(ScanSubject::PurchaseIntake, ScanType::Checking),
            Ok(Processor::Document(ScanProcessor::Checking))
        );
        assert_eq!(
            ProcessorFactory::resolve(ScanSubject::Location, ScanType::InventoryCount),
            Ok(Processor::InventoryCount(InventoryCountProcessor))
        );
    }

    #[test]
    fn test_factory_rejects_unsupported_pairs() {
        for (subject, scan_type) in [
            (ScanSubject::PurchaseIntake, ScanType::Prepare),
            (ScanSubject::PurchaseIntake, ScanType::Shipping),
            (ScanSubject::Transfer, ScanType::InventoryCount),
            (ScanSubject::Location, ScanType::Receive),
        ] {
            let err = ProcessorFactory::resolve(subject, scan_type).unwrap_err();
            assert!(err.localized(crate::types::Language::Vietnamese).contains(scan_type.as_str()));
        }
    }

    #[test]
    fn test_auto_validate_defaults() {
        assert!(ScanProcessor::Shipping.auto_validate_default());
        assert!(ScanProcessor::Checking.auto_validate_default());
        assert!(!ScanProcessor::Prepare.auto_validate_default());
        assert!(!ScanProcessor::Receive.auto_validate_default());
    }
}
