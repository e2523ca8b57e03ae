//! # Branch Hierarchy
//!
//! Two-level head / sub-branch tree that scopes stock views and transfers.
//!
//! ```text
//!        H1 (head)              H2 (head)          X1 (standalone)
//!       ┌──┴──┐                    │
//!      S1     S2                  S3
//!
//!  managed_branches(H1) = [H1, S1, S2]
//!  managed_branches(X1) = [X1]
//!  owning_head(S2)      = H1
//!  head_branches()      = [H1, H2]
//! ```
//!
//! A head is a branch that appears as a parent. Branches with no edge at all
//! are standalone: they manage only themselves and are not listed as heads.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoreError, CoreResult};
use crate::types::{Branch, HierarchyEdge};

/// Resolved branch registry plus parent links.
#[derive(Debug, Clone, Default)]
pub struct BranchHierarchy {
    branches: BTreeMap<String, Branch>,
    /// sub → parent
    parent_of: BTreeMap<String, String>,
    /// parent → subs (sorted)
    children_of: BTreeMap<String, BTreeSet<String>>,
}

impl BranchHierarchy {
    /// Builds the resolver, rejecting edges that break the two-level shape.
    ///
    /// ## Errors
    /// - `InvalidHierarchy` for a self-parent, a duplicate sub-branch, a
    ///   parent that is itself a sub-branch, or an edge to an unknown branch
    pub fn new(branches: Vec<Branch>, edges: Vec<HierarchyEdge>) -> CoreResult<Self> {
        let mut hierarchy = BranchHierarchy {
            branches: branches
                .into_iter()
                .map(|b| (b.branch_id.clone(), b))
                .collect(),
            ..Default::default()
        };
        for edge in &edges {
            hierarchy.check_edge(edge)?;
            hierarchy
                .parent_of
                .insert(edge.sub_branch_id.clone(), edge.parent_branch_id.clone());
            hierarchy
                .children_of
                .entry(edge.parent_branch_id.clone())
                .or_default()
                .insert(edge.sub_branch_id.clone());
        }
        Ok(hierarchy)
    }

    /// Validates one edge against the edges accepted so far.
    pub fn check_edge(&self, edge: &HierarchyEdge) -> CoreResult<()> {
        let sub = &edge.sub_branch_id;
        let parent = &edge.parent_branch_id;

        for id in [sub, parent] {
            if !self.branches.contains_key(id) {
                return Err(CoreError::InvalidHierarchy(format!("unknown branch {}", id)));
            }
        }
        if sub == parent {
            return Err(CoreError::InvalidHierarchy(format!(
                "{} cannot be its own parent",
                sub
            )));
        }
        if let Some(existing) = self.parent_of.get(sub) {
            return Err(CoreError::InvalidHierarchy(format!(
                "{} already belongs to {}",
                sub, existing
            )));
        }
        if self.parent_of.contains_key(parent) {
            return Err(CoreError::InvalidHierarchy(format!(
                "{} is a sub-branch and cannot manage {}",
                parent, sub
            )));
        }
        if self.children_of.contains_key(sub) {
            return Err(CoreError::InvalidHierarchy(format!(
                "{} is a head branch and cannot be placed under {}",
                sub, parent
            )));
        }
        Ok(())
    }

    pub fn contains(&self, branch_id: &str) -> bool {
        self.branches.contains_key(branch_id)
    }

    pub fn branch(&self, branch_id: &str) -> Option<&Branch> {
        self.branches.get(branch_id)
    }

    /// Every branch, sorted by id.
    pub fn all_branches(&self) -> Vec<Branch> {
        self.branches.values().cloned().collect()
    }

    /// Branches that manage at least one sub-branch, sorted by id.
    pub fn head_branches(&self) -> Vec<Branch> {
        self.children_of
            .keys()
            .filter_map(|id| self.branches.get(id).cloned())
            .collect()
    }

    pub fn is_head(&self, branch_id: &str) -> bool {
        self.children_of.contains_key(branch_id)
    }

    /// The head first, then its sub-branches by id.
    ///
    /// ## Errors
    /// `NotFound` when `head_id` is not a known branch.
    pub fn managed_branches(&self, head_id: &str) -> CoreResult<Vec<Branch>> {
        let head = self
            .branches
            .get(head_id)
            .ok_or_else(|| CoreError::not_found("Branch", head_id))?;

        let mut managed = vec![head.clone()];
        managed.extend(self.sub_branches(head_id)?);
        Ok(managed)
    }

    /// Ids of [`managed_branches`](Self::managed_branches).
    pub fn managed_ids(&self, head_id: &str) -> CoreResult<Vec<String>> {
        Ok(self
            .managed_branches(head_id)?
            .into_iter()
            .map(|b| b.branch_id)
            .collect())
    }

    /// Sub-branches only, sorted by id.
    pub fn sub_branches(&self, head_id: &str) -> CoreResult<Vec<Branch>> {
        if !self.contains(head_id) {
            return Err(CoreError::not_found("Branch", head_id));
        }
        Ok(self
            .children_of
            .get(head_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.branches.get(id).cloned())
            .collect())
    }

    /// Parent of a sub-branch, or the branch itself for heads and standalones.
    pub fn owning_head(&self, branch_id: &str) -> CoreResult<String> {
        if !self.contains(branch_id) {
            return Err(CoreError::not_found("Branch", branch_id));
        }
        Ok(self
            .parent_of
            .get(branch_id)
            .cloned()
            .unwrap_or_else(|| branch_id.to_string()))
    }

    /// Checks that `to` lies in the territory of `from`'s owning head.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown `from` or `to`
    /// - `InvalidDestination` when `to == from` or outside the territory
    pub fn validate_destination(&self, from: &str, to: &str) -> CoreResult<()> {
        if !self.contains(to) {
            return Err(CoreError::not_found("Branch", to));
        }
        let head = self.owning_head(from)?;
        let territory = self.managed_ids(&head)?;
        if to == from || !territory.iter().any(|id| id == to) {
            return Err(CoreError::InvalidDestination {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> BranchHierarchy {
        let branches = ["H1", "H2", "S1", "S2", "S3", "X1"]
            .iter()
            .map(|id| Branch::new(*id, format!("Branch {}", id)))
            .collect();
        let edges = vec![
            HierarchyEdge::new("S2", "H1"),
            HierarchyEdge::new("S1", "H1"),
            HierarchyEdge::new("S3", "H2"),
        ];
        BranchHierarchy::new(branches, edges).unwrap()
    }

    fn ids(branches: Vec<Branch>) -> Vec<String> {
        branches.into_iter().map(|b| b.branch_id).collect()
    }

    #[test]
    fn test_head_branches_are_parents_only() {
        let h = network();
        assert_eq!(ids(h.head_branches()), vec!["H1", "H2"]);
        assert!(!h.is_head("X1"));
    }

    #[test]
    fn test_managed_branches() {
        let h = network();
        assert_eq!(ids(h.managed_branches("H1").unwrap()), vec!["H1", "S1", "S2"]);
        assert_eq!(ids(h.managed_branches("X1").unwrap()), vec!["X1"]);
        assert!(matches!(
            h.managed_branches("NOPE"),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_owning_head_and_subs() {
        let h = network();
        assert_eq!(h.owning_head("S2").unwrap(), "H1");
        assert_eq!(h.owning_head("H1").unwrap(), "H1");
        assert_eq!(h.owning_head("X1").unwrap(), "X1");
        assert_eq!(ids(h.sub_branches("H2").unwrap()), vec!["S3"]);
        assert!(h.sub_branches("X1").unwrap().is_empty());
    }

    #[test]
    fn test_empty_hierarchy_has_no_heads() {
        let h = BranchHierarchy::new(vec![Branch::new("A", "A")], vec![]).unwrap();
        assert!(h.head_branches().is_empty());
    }

    #[test]
    fn test_validate_destination() {
        let h = network();
        assert!(h.validate_destination("H1", "S1").is_ok());
        assert!(h.validate_destination("S1", "S2").is_ok());
        assert!(h.validate_destination("S1", "H1").is_ok());
        assert!(matches!(
            h.validate_destination("S1", "S3"),
            Err(CoreError::InvalidDestination { .. })
        ));
        assert!(matches!(
            h.validate_destination("S1", "S1"),
            Err(CoreError::InvalidDestination { .. })
        ));
        assert!(matches!(
            h.validate_destination("S1", "ZZ"),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_rejects_three_levels_and_loops() {
        let branches: Vec<Branch> = ["A", "B", "C"]
            .iter()
            .map(|id| Branch::new(*id, *id))
            .collect();

        let deep = BranchHierarchy::new(
            branches.clone(),
            vec![HierarchyEdge::new("B", "A"), HierarchyEdge::new("C", "B")],
        );
        assert!(matches!(deep, Err(CoreError::InvalidHierarchy(_))));

        let under_sub = BranchHierarchy::new(
            branches.clone(),
            vec![HierarchyEdge::new("C", "B"), HierarchyEdge::new("B", "A")],
        );
        assert!(matches!(under_sub, Err(CoreError::InvalidHierarchy(_))));

        let own = BranchHierarchy::new(branches.clone(), vec![HierarchyEdge::new("A", "A")]);
        assert!(matches!(own, Err(CoreError::InvalidHierarchy(_))));

        let twice = BranchHierarchy::new(
            branches,
            vec![HierarchyEdge::new("C", "A"), HierarchyEdge::new("C", "B")],
        );
        assert!(matches!(twice, Err(CoreError::InvalidHierarchy(_))));
    }
}
