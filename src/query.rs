//! Builds a search expression tree from a formatted search string.
//!
//! Terms sharing an operator are ORed together and the per-operator groups are
//! ANDed, so `name:a name:b port:22` reads as `(name:a OR name:b) AND port:22`.

use crate::ast::{Node, OperationKind};
use crate::compiler::CompileError;
use crate::parser::{parse_terms, Term};
use crate::schema::{
    AssociationResolver, AttributeRef, AttributeResolver, OperatorTarget, ResolveError,
};
use indexmap::IndexMap;

/// A parsed and resolved search against one model
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub model: String,
    pub terms: Vec<Term>,
    tree: Node,
}

impl Query {
    pub fn new<R>(formatted: &str, model: &str, resolver: &R) -> Result<Self, CompileError>
    where
        R: AssociationResolver + AttributeResolver + ?Sized,
    {
        let terms = parse_terms(formatted)?;
        let tree = build_tree(&terms, model, resolver)?;

        Ok(Self {
            model: model.to_string(),
            terms,
            tree,
        })
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }

    pub fn into_tree(self) -> Node {
        self.tree
    }
}

fn build_tree<R>(terms: &[Term], model: &str, resolver: &R) -> Result<Node, ResolveError>
where
    R: AssociationResolver + AttributeResolver + ?Sized,
{
    let mut by_operator: IndexMap<&str, Vec<&Term>> = IndexMap::new();
    for term in terms {
        by_operator.entry(term.operator.as_str()).or_default().push(term);
    }

    let mut groups = Vec::with_capacity(by_operator.len());
    for group in by_operator.values() {
        let operations = group
            .iter()
            .map(|term| operation_node(model, term, resolver))
            .collect::<Result<Vec<_>, _>>()?;
        groups.push(Node::Union(operations));
    }

    Ok(Node::Intersection(groups))
}

fn operation_kind(term: &Term, attribute: &AttributeRef) -> OperationKind {
    if !term.quoted && term.value.eq_ignore_ascii_case("null") {
        OperationKind::Null
    } else {
        OperationKind::for_type(attribute.ty)
    }
}

/// One operation per attribute the operator resolves to. A union operator
/// becomes a [`Node::Union`] of operations.
fn expand<F>(target: OperatorTarget, term: &Term, leaf: F) -> Node
where
    F: Fn(AttributeRef) -> Node,
{
    let operation = |attribute: AttributeRef| {
        let kind = operation_kind(term, &attribute);
        Node::operation(kind, leaf(attribute), term.value.as_str())
    };

    match target {
        OperatorTarget::Attribute(attribute) => operation(attribute),
        OperatorTarget::Union(attributes) => Node::Union(attributes.into_iter().map(operation).collect()),
    }
}

fn operation_node<R>(model: &str, term: &Term, resolver: &R) -> Result<Node, ResolveError>
where
    R: AssociationResolver + AttributeResolver + ?Sized,
{
    let Some((association_name, attribute_name)) = term.operator.split_once('.') else {
        let target = resolver.resolve_operator(model, &term.operator)?;
        return Ok(expand(target, term, Node::attribute));
    };

    let association = resolver.resolve_association(model, association_name)?;
    let target_model = association.target.as_deref().ok_or_else(|| ResolveError::NotJoinable {
        model: model.to_string(),
        name: association_name.to_string(),
    })?;
    let target = resolver.resolve_operator(target_model, attribute_name)?;

    Ok(expand(target, term, |attribute| Node::association(association.clone(), attribute)))
}
