//! Plans the associations a search needs: which to JOIN for filtering and
//! which to eager-load for the returned rows.

pub mod ast;
pub mod compiler;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod schema;
pub mod token;
pub mod visitor;

pub use ast::Node;
pub use compiler::{CompileError, CompileResult, SearchCompiler};
pub use schema::{AssociationRef, AssociationResolver, AttributeResolver, Schema};
pub use visitor::{AssociationSet, Includes, Joins, Visitor};
