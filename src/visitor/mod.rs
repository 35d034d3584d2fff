//! Association planning over a search expression tree.
//!
//! [`Visitor::visit`] dispatches on the node variant. Every visitor implements
//! one method per variant, so adding a variant to [`Node`] breaks the build of
//! each visitor until it handles the new case.

pub mod includes;
pub mod joins;

pub use includes::Includes;
pub use joins::Joins;

use crate::ast::{AssociationOperator, AttributeOperator, Node, Operation};
use crate::schema::AssociationRef;
use indexmap::IndexSet;

/// Associations in leftmost-first traversal order, without duplicates.
pub type AssociationSet = IndexSet<AssociationRef>;

pub trait Visitor {
    fn visit(&self, node: &Node) -> AssociationSet {
        match node {
            Node::Intersection(children) => self.visit_intersection(children),
            Node::Union(children) => self.visit_union(children),
            Node::Attribute(operator) => self.visit_attribute(operator),
            Node::Association(operator) => self.visit_association(operator),
            Node::Operation(operation) => self.visit_operation(operation),
        }
    }

    fn visit_intersection(&self, children: &[Node]) -> AssociationSet;

    fn visit_union(&self, children: &[Node]) -> AssociationSet;

    fn visit_attribute(&self, operator: &AttributeOperator) -> AssociationSet;

    fn visit_association(&self, operator: &AssociationOperator) -> AssociationSet;

    fn visit_operation(&self, operation: &Operation) -> AssociationSet;
}

/// Set union of every set, keeping first-seen order.
pub fn union_of<I>(sets: I) -> AssociationSet
where
    I: IntoIterator<Item = AssociationSet>,
{
    let mut acc = AssociationSet::new();
    for set in sets {
        acc.extend(set);
    }
    acc
}

/// Set intersection of every set, in the order of the first set.
///
/// Empty when there are no sets. Stops pulling from `sets` once the running
/// intersection is empty, so a lazy iterator skips the remaining children.
pub fn intersection_of<I>(sets: I) -> AssociationSet
where
    I: IntoIterator<Item = AssociationSet>,
{
    let mut sets = sets.into_iter();
    let Some(mut acc) = sets.next() else {
        return AssociationSet::new();
    };

    while !acc.is_empty() {
        let Some(set) = sets.next() else {
            break;
        };
        acc.retain(|association| set.contains(association));
    }
    acc
}

pub(crate) fn singleton(association: &AssociationRef) -> AssociationSet {
    AssociationSet::from([association.clone()])
}
