//! # Branch Commands
//!
//! Branch lists scoped by the hierarchy, and the source picker for inward
//! deliveries.
//!
//! ```text
//! H1 ─┬─ S1        list_head_branches()      → [H1, H2]
//!     └─ S2        list_managed_branches(H1) → [H1, S1, S2]
//! H2 ─── S3        list_sub_branches(H1)     → [S1, S2]
//!                  inward_source_options(S1) → [HMSI (OEM), Other External, H1, H2, S2, S3]
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use fleetline_core::Branch;

use crate::config::DisplaySettings;
use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, MasterDataCache};

/// One entry of the inward source picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InwardSourceOption {
    /// Value passed back as `source` on submit.
    pub value: String,
    pub label: String,
    /// True when the value is a branch id (internal movement).
    pub internal: bool,
}

/// Every branch that owns at least one sub-branch.
pub async fn list_head_branches(db: &DbState, cache: &MasterDataCache) -> ApiResult<Vec<Branch>> {
    debug!("list_head_branches command");
    let hierarchy = cache.hierarchy(db.inner()).await?;
    Ok(hierarchy.head_branches())
}

/// The head followed by its sub-branches.
///
/// ## Errors
/// `NotFound` when `head` is not a known branch.
pub async fn list_managed_branches(
    db: &DbState,
    cache: &MasterDataCache,
    head: &str,
) -> ApiResult<Vec<Branch>> {
    debug!(head = %head, "list_managed_branches command");
    let hierarchy = cache.hierarchy(db.inner()).await?;
    Ok(hierarchy.managed_branches(head.trim())?)
}

pub async fn list_all_branches(db: &DbState, cache: &MasterDataCache) -> ApiResult<Vec<Branch>> {
    let hierarchy = cache.hierarchy(db.inner()).await?;
    Ok(hierarchy.all_branches())
}

/// Transfer destinations offered from a head.
pub async fn list_sub_branches(
    db: &DbState,
    cache: &MasterDataCache,
    head: &str,
) -> ApiResult<Vec<Branch>> {
    debug!(head = %head, "list_sub_branches command");
    let hierarchy = cache.hierarchy(db.inner()).await?;
    Ok(hierarchy.sub_branches(head.trim())?)
}

/// Sources an inward delivery into `dest` may come from: the two external
/// labels, then every other branch.
pub async fn inward_source_options(
    db: &DbState,
    cache: &MasterDataCache,
    display: &DisplaySettings,
    dest: &str,
) -> ApiResult<Vec<InwardSourceOption>> {
    let dest = dest.trim();
    let hierarchy = cache.hierarchy(db.inner()).await?;
    if !hierarchy.contains(dest) {
        return Err(ApiError::not_found("Branch", dest));
    }

    let mut options: Vec<InwardSourceOption> =
        [&display.oem_source_label, &display.other_source_label]
            .into_iter()
            .map(|label| InwardSourceOption {
                value: label.clone(),
                label: label.clone(),
                internal: false,
            })
            .collect();

    options.extend(
        hierarchy
            .all_branches()
            .into_iter()
            .filter(|b| b.branch_id != dest)
            .map(|b| InwardSourceOption {
                label: format!("{} ({})", b.branch_name, b.branch_id),
                value: b.branch_id,
                internal: true,
            }),
    );

    debug!(dest = %dest, count = options.len(), "inward_source_options command");
    Ok(options)
}
