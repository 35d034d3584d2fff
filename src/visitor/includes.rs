//! Associations worth eager-loading once a search has run.

use super::{intersection_of, singleton, union_of, AssociationSet, Visitor};
use crate::ast::{AssociationOperator, AttributeOperator, Node, Operation};

/// Computes the associations to eager-load for the rows a search returns.
///
/// Every association under an AND is loaded. Under an OR a row may satisfy a
/// single branch, so only associations common to all branches are loaded.
/// This runs as its own pass and never reads the [`Joins`](super::Joins) result.
#[derive(Debug, Clone, Copy, Default)]
pub struct Includes;

impl Visitor for Includes {
    fn visit_intersection(&self, children: &[Node]) -> AssociationSet {
        union_of(children.iter().map(|child| self.visit(child)))
    }

    fn visit_union(&self, children: &[Node]) -> AssociationSet {
        let includes = intersection_of(children.iter().map(|child| self.visit(child)));
        if includes.is_empty() && !children.is_empty() {
            tracing::trace!(children = children.len(), "union shares no includes");
        }
        includes
    }

    fn visit_attribute(&self, _operator: &AttributeOperator) -> AssociationSet {
        AssociationSet::new()
    }

    fn visit_association(&self, operator: &AssociationOperator) -> AssociationSet {
        singleton(&operator.association)
    }

    fn visit_operation(&self, operation: &Operation) -> AssociationSet {
        self.visit(&operation.operator)
    }
}
