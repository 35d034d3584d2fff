//! The search expression tree.

use crate::schema::{AssociationRef, AttributeRef, AttributeType};

/// A node of a search expression.
///
/// The tree is built once per search and only read afterwards. Group-level and
/// operator-level unions are both represented by [`Node::Union`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Logical AND of the children
    Intersection(Vec<Node>),
    /// Logical OR of the children
    Union(Vec<Node>),
    Attribute(AttributeOperator),
    Association(AssociationOperator),
    Operation(Operation),
}

/// Filters a scalar column on the searched model.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeOperator {
    pub attribute: AttributeRef,
}

/// Filters a column reached through an association, e.g. `services.name`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationOperator {
    pub association: AssociationRef,
    /// Column on the association's target model
    pub attribute: AttributeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Boolean,
    Date,
    Integer,
    Null,
    String,
    SetInteger,
    SetString,
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Boolean,
        OperationKind::Date,
        OperationKind::Integer,
        OperationKind::Null,
        OperationKind::String,
        OperationKind::SetInteger,
        OperationKind::SetString,
    ];

    /// The operation used for a non-null value of the given column type
    pub fn for_type(ty: AttributeType) -> Self {
        match ty {
            AttributeType::Boolean => OperationKind::Boolean,
            AttributeType::Date => OperationKind::Date,
            AttributeType::Integer => OperationKind::Integer,
            AttributeType::String => OperationKind::String,
            AttributeType::SetInteger => OperationKind::SetInteger,
            AttributeType::SetString => OperationKind::SetString,
        }
    }
}

/// An operator applied to a value. The value is kept as written; interpreting
/// it is left to query execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub operator: Box<Node>,
    pub value: String,
}

impl Node {
    pub fn attribute(attribute: AttributeRef) -> Self {
        Node::Attribute(AttributeOperator { attribute })
    }

    pub fn association(association: AssociationRef, attribute: AttributeRef) -> Self {
        Node::Association(AssociationOperator {
            association,
            attribute,
        })
    }

    pub fn operation(kind: OperationKind, operator: Node, value: impl Into<String>) -> Self {
        Node::Operation(Operation {
            kind,
            operator: Box::new(operator),
            value: value.into(),
        })
    }

    /// Nesting depth; a leaf has depth 1.
    ///
    /// Walks with an explicit stack so it can be checked before any recursive
    /// visit of an untrusted tree.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1)];

        while let Some((node, level)) = stack.pop() {
            max = max.max(level);
            match node {
                Node::Intersection(children) | Node::Union(children) => {
                    stack.extend(children.iter().map(|child| (child, level + 1)));
                }
                Node::Attribute(_) | Node::Association(_) => {}
                Node::Operation(operation) => stack.push((operation.operator.as_ref(), level + 1)),
            }
        }
        max
    }
}
