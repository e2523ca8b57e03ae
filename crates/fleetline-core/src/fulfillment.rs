//! # Fulfillment Workflow
//!
//! State machine overlaid on customer sale records. Independent of the
//! stock ledger.
//!
//! ## States
//! ```text
//! ┌──────────────────────────┐  assign(mechanic)   ┌──────────────────┐
//! │  Pending PDI Assignment  │ ──────────────────► │  PDI In Progress │
//! └──────────────────────────┘                     └────────┬─────────┘
//!                                                           │ complete_pdi(chassis)
//!                                                           ▼
//!   ┌──────────┐  tr_done   ┌────────────────┐ insurance ┌──────────────┐
//!   │ TR Done  │ ◄───────── │ Insurance Done │ ◄──────── │ PDI Complete │
//!   └──────────┘            └────────────────┘           └──────────────┘
//!        ▲                                                      │
//!        └──────────────────────── tr_done ─────────────────────┘
//! ```
//!
//! Compliance flags may be set at any time, but they only move the status
//! once PDI is complete, and the status never moves backwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::VehicleDescriptor;
use crate::validation::{validate_branch_id, validate_chassis_no, validate_required};

// =============================================================================
// Status
// =============================================================================

/// Where a sold vehicle is in pre-delivery processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum FulfillmentStatus {
    #[serde(rename = "Pending PDI Assignment")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Pending PDI Assignment"))]
    PendingAssignment,
    #[serde(rename = "PDI In Progress")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PDI In Progress"))]
    PdiInProgress,
    #[serde(rename = "PDI Complete")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PDI Complete"))]
    PdiComplete,
    #[serde(rename = "Insurance Done")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Insurance Done"))]
    InsuranceDone,
    #[serde(rename = "TR Done")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "TR Done"))]
    TrDone,
}

impl FulfillmentStatus {
    pub const ALL: [FulfillmentStatus; 5] = [
        FulfillmentStatus::PendingAssignment,
        FulfillmentStatus::PdiInProgress,
        FulfillmentStatus::PdiComplete,
        FulfillmentStatus::InsuranceDone,
        FulfillmentStatus::TrDone,
    ];

    /// Display (and stored) string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::PendingAssignment => "Pending PDI Assignment",
            FulfillmentStatus::PdiInProgress => "PDI In Progress",
            FulfillmentStatus::PdiComplete => "PDI Complete",
            FulfillmentStatus::InsuranceDone => "Insurance Done",
            FulfillmentStatus::TrDone => "TR Done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == FulfillmentStatus::TrDone
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FulfillmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "fulfillment_status".to_string(),
                allowed: FulfillmentStatus::ALL
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Compliance Flags
// =============================================================================

/// Paperwork steps tracked after PDI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ComplianceFlag {
    InsuranceDone,
    TrDone,
    DuesCleared,
    TaxPaid,
}

/// One requested flag change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComplianceUpdate {
    pub flag: ComplianceFlag,
    pub value: bool,
}

/// The four compliance booleans of a sale record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComplianceFlags {
    pub insurance_done: bool,
    pub tr_done: bool,
    pub dues_cleared: bool,
    pub tax_paid: bool,
}

impl ComplianceFlags {
    pub fn set_insurance_done(&mut self, value: bool) {
        self.insurance_done = value;
    }

    pub fn set_tr_done(&mut self, value: bool) {
        self.tr_done = value;
    }

    pub fn set_dues_cleared(&mut self, value: bool) {
        self.dues_cleared = value;
    }

    pub fn set_tax_paid(&mut self, value: bool) {
        self.tax_paid = value;
    }

    /// Applies one update through its flag's setter.
    pub fn apply(&mut self, update: ComplianceUpdate) {
        match update.flag {
            ComplianceFlag::InsuranceDone => self.set_insurance_done(update.value),
            ComplianceFlag::TrDone => self.set_tr_done(update.value),
            ComplianceFlag::DuesCleared => self.set_dues_cleared(update.value),
            ComplianceFlag::TaxPaid => self.set_tax_paid(update.value),
        }
    }
}

/// Status after compliance flags change.
///
/// TR wins over insurance. Before PDI is complete, or when the flags point
/// to an earlier state, the current status is kept.
pub fn status_after_compliance(
    current: FulfillmentStatus,
    flags: &ComplianceFlags,
) -> FulfillmentStatus {
    if current < FulfillmentStatus::PdiComplete {
        return current;
    }
    let candidate = if flags.tr_done {
        FulfillmentStatus::TrDone
    } else if flags.insurance_done {
        FulfillmentStatus::InsuranceDone
    } else {
        current
    };
    current.max(candidate)
}

// =============================================================================
// Sales Record
// =============================================================================

/// A customer sale awaiting (or past) pre-delivery inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesRecord {
    pub id: i64,
    pub branch_id: String,
    /// Delivery challan number.
    pub dc_number: String,
    pub customer_name: String,
    pub sales_staff: String,
    pub model: String,
    pub variant: String,
    pub paint_color: String,
    pub fulfillment_status: FulfillmentStatus,
    pub pdi_assigned_to: Option<String>,
    pub chassis_no: Option<String>,
    #[ts(as = "Option<String>")]
    pub pdi_completion_date: Option<DateTime<Utc>>,
    pub insurance_done: bool,
    pub tr_done: bool,
    pub dues_cleared: bool,
    pub tax_paid: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SalesRecord {
    fn transition_error(&self, operation: &str) -> CoreError {
        CoreError::InvalidTransition {
            sale_id: self.id,
            current_status: self.fulfillment_status.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn flags(&self) -> ComplianceFlags {
        ComplianceFlags {
            insurance_done: self.insurance_done,
            tr_done: self.tr_done,
            dues_cleared: self.dues_cleared,
            tax_paid: self.tax_paid,
        }
    }

    /// Pending → PDI In Progress, recording the mechanic.
    pub fn assign_pdi(&mut self, mechanic: &str) -> CoreResult<()> {
        let mechanic = validate_required("mechanic", mechanic)?;
        if self.fulfillment_status != FulfillmentStatus::PendingAssignment {
            return Err(self.transition_error("assign PDI"));
        }
        self.pdi_assigned_to = Some(mechanic);
        self.fulfillment_status = FulfillmentStatus::PdiInProgress;
        Ok(())
    }

    /// PDI In Progress → PDI Complete, capturing the chassis number.
    pub fn complete_pdi(&mut self, chassis_no: &str, completed_at: DateTime<Utc>) -> CoreResult<()> {
        let chassis_no = validate_chassis_no(chassis_no)?;
        if self.fulfillment_status != FulfillmentStatus::PdiInProgress {
            return Err(self.transition_error("complete PDI"));
        }
        self.chassis_no = Some(chassis_no);
        self.pdi_completion_date = Some(completed_at);
        self.fulfillment_status = FulfillmentStatus::PdiComplete;
        Ok(())
    }

    /// Applies flag updates in order, then re-derives the status.
    pub fn apply_compliance(&mut self, updates: &[ComplianceUpdate]) {
        let mut flags = self.flags();
        for update in updates {
            flags.apply(*update);
        }
        self.insurance_done = flags.insurance_done;
        self.tr_done = flags.tr_done;
        self.dues_cleared = flags.dues_cleared;
        self.tax_paid = flags.tax_paid;
        self.fulfillment_status = status_after_compliance(self.fulfillment_status, &flags);
    }
}

/// Input for registering a customer sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSalesRecord {
    pub branch_id: String,
    pub dc_number: String,
    pub customer_name: String,
    pub sales_staff: String,
    pub model: String,
    pub variant: String,
    pub paint_color: String,
}

impl NewSalesRecord {
    /// Validates required fields and returns a normalized copy.
    pub fn validated(&self) -> CoreResult<NewSalesRecord> {
        validate_branch_id(&self.branch_id)?;
        let descriptor = VehicleDescriptor::new(&self.model, &self.variant, &self.paint_color);
        descriptor.ensure_complete()?;
        Ok(NewSalesRecord {
            branch_id: self.branch_id.trim().to_string(),
            dc_number: validate_required("dc_number", &self.dc_number)?,
            customer_name: validate_required("customer_name", &self.customer_name)?,
            sales_staff: self.sales_staff.trim().to_string(),
            model: descriptor.model,
            variant: descriptor.variant,
            paint_color: descriptor.color,
        })
    }
}
