//! Associations that must be joined to evaluate a search in one query.

use super::{intersection_of, singleton, union_of, AssociationSet, Visitor};
use crate::ast::{AssociationOperator, AttributeOperator, Node, Operation};

/// Computes the associations to JOIN so a single query can filter on the
/// whole expression.
///
/// An AND needs every association any branch touches. An OR can only be
/// pushed through a join when every branch shares the join path; otherwise
/// inner-join semantics would drop rows that match only the branch without
/// the association, so such a union joins nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Joins;

impl Visitor for Joins {
    fn visit_intersection(&self, children: &[Node]) -> AssociationSet {
        union_of(children.iter().map(|child| self.visit(child)))
    }

    fn visit_union(&self, children: &[Node]) -> AssociationSet {
        let joins = intersection_of(children.iter().map(|child| self.visit(child)));
        if joins.is_empty() && !children.is_empty() {
            tracing::trace!(children = children.len(), "union shares no join path");
        }
        joins
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
