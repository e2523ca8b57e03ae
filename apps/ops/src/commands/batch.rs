//! # Batch Commands
//!
//! Build up the session's inward, transfer and sales batches line by line.
//! Submitting happens in [`movement`](super::movement).

use serde::{Deserialize, Serialize};
use tracing::debug;

use fleetline_core::{BatchItem, BatchKind, VehicleBatch};

use crate::error::ApiResult;
use crate::state::{OpsDesk, SessionState};

/// Batch contents as shown next to the entry form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchView {
    pub kind: BatchKind,
    pub items: Vec<BatchItem>,
    pub total_quantity: i64,
}

impl BatchView {
    fn of(kind: BatchKind, batch: &VehicleBatch) -> Self {
        BatchView {
            kind,
            items: batch.items().to_vec(),
            total_quantity: batch.total_quantity(),
        }
    }
}

/// Adds a line; an identical descriptor merges into the existing line.
///
/// ## Errors
/// `InvalidInput` for a blank descriptor part, a quantity outside 1..=999
/// (also after merging) or a full batch. The batch is unchanged on error.
pub fn add_to_batch(
    session: &SessionState,
    desk: &OpsDesk,
    kind: BatchKind,
    item: BatchItem,
) -> ApiResult<BatchView> {
    debug!(
        actor = %desk.actor(),
        %kind,
        model = %item.model,
        qty = item.quantity,
        "add_to_batch command"
    );
    session.with_batch_mut(kind, |batch| -> ApiResult<BatchView> {
        batch.add(item)?;
        Ok(BatchView::of(kind, batch))
    })
}

/// Removes the line at `index`.
///
/// ## Errors
/// `NotFound` when `index` is past the end.
pub fn remove_from_batch(
    session: &SessionState,
    desk: &OpsDesk,
    kind: BatchKind,
    index: usize,
) -> ApiResult<BatchView> {
    debug!(actor = %desk.actor(), %kind, index, "remove_from_batch command");
    session.with_batch_mut(kind, |batch| -> ApiResult<BatchView> {
        batch.remove(index)?;
        Ok(BatchView::of(kind, batch))
    })
}

pub fn clear_batch(session: &SessionState, desk: &OpsDesk, kind: BatchKind) -> BatchView {
    debug!(actor = %desk.actor(), %kind, "clear_batch command");
    session.clear_batch(kind);
    BatchView::of(kind, &VehicleBatch::new())
}

pub fn view_batch(session: &SessionState, _desk: &OpsDesk, kind: BatchKind) -> BatchView {
    BatchView::of(kind, &session.batch(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use fleetline_core::{Identity, Role, VehicleDescriptor};

    fn session() -> (SessionState, OpsDesk) {
        let session = SessionState::new();
        session.sign_in(Identity {
            username: "pdi1".into(),
            role: Role::Pdi,
            branch_id: None,
        });
        let desk = session.ops_desk().unwrap();
        (session, desk)
    }

    fn item(model: &str, color: &str, qty: i64) -> BatchItem {
        BatchItem::new(VehicleDescriptor::new(model, "STD", color), qty)
    }

    #[test]
    fn test_add_merges_identical_descriptor() {
        let (session, desk) = session();
        add_to_batch(&session, &desk, BatchKind::Inward, item("Activa", "Red", 2)).unwrap();
        let view =
            add_to_batch(&session, &desk, BatchKind::Inward, item("activa ", "red", 1)).unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].model, "ACTIVA");
        assert_eq!(view.total_quantity, 3);
    }

    #[test]
    fn test_invalid_line_leaves_batch_untouched() {
        let (session, desk) = session();
        add_to_batch(&session, &desk, BatchKind::Sales, item("Shine", "Blue", 998)).unwrap();

        let err =
            add_to_batch(&session, &desk, BatchKind::Sales, item("Shine", "Blue", 5)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let err =
            add_to_batch(&session, &desk, BatchKind::Sales, item("Shine", "Blue", 0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        assert_eq!(view_batch(&session, &desk, BatchKind::Sales).total_quantity, 998);
    }

    #[test]
    fn test_remove_and_clear() {
        let (session, desk) = session();
        add_to_batch(&session, &desk, BatchKind::Transfer, item("Activa", "Red", 1)).unwrap();
        add_to_batch(&session, &desk, BatchKind::Transfer, item("Activa", "Blue", 1)).unwrap();

        let view = remove_from_batch(&session, &desk, BatchKind::Transfer, 0).unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].color, "BLUE");

        let err = remove_from_batch(&session, &desk, BatchKind::Transfer, 5).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        assert!(clear_batch(&session, &desk, BatchKind::Transfer).items.is_empty());
        assert!(view_batch(&session, &desk, BatchKind::Transfer).items.is_empty());
    }
}
