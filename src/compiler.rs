//! Search compiler that turns a search into the associations to join and to
//! eager-load.

use crate::ast::Node;
use crate::config::{CompilerConfig, ConfigError, SchemaConfig};
use crate::parser::ParseError;
use crate::query::Query;
use crate::schema::{AssociationResolver, AttributeResolver, ResolveError, Schema};
use crate::visitor::{AssociationSet, Includes, Joins, Visitor};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("search nests {depth} levels deep, limit is {max_depth}")]
    TooDeep { depth: usize, max_depth: usize },
}

/// Result of compiling a search
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub tree: Node,
    /// Associations the query must JOIN to filter
    pub joins: AssociationSet,
    /// Associations to eager-load after the query runs
    pub includes: AssociationSet,
}

impl CompileResult {
    pub fn join_names(&self) -> Vec<&str> {
        self.joins.iter().map(|association| association.name.as_str()).collect()
    }

    pub fn include_names(&self) -> Vec<&str> {
        self.includes.iter().map(|association| association.name.as_str()).collect()
    }
}

/// Compiles searches against the models known to a resolver
pub struct SearchCompiler<R = Schema> {
    resolver: R,
    config: CompilerConfig,
}

impl SearchCompiler<Schema> {
    /// Build a compiler over a schema loaded from configuration
    pub fn from_config(schema: &SchemaConfig, config: CompilerConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_config(Schema::from_config(schema)?, config))
    }
}

impl<R> SearchCompiler<R>
where
    R: AssociationResolver + AttributeResolver,
{
    pub fn new(resolver: R) -> Self {
        Self::with_config(resolver, CompilerConfig::default())
    }

    pub fn with_config(resolver: R, config: CompilerConfig) -> Self {
        Self { resolver, config }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Parse `formatted` against `model` and plan its joins and includes
    pub fn compile(&self, formatted: &str, model: &str) -> Result<CompileResult, CompileError> {
        let query = Query::new(formatted, model, &self.resolver)?;
        let result = self.compile_tree(query.into_tree())?;

        tracing::debug!(
            model,
            search = formatted,
            joins = ?result.join_names(),
            includes = ?result.include_names(),
            "compiled search"
        );
        Ok(result)
    }

    /// Plan joins and includes for an already built tree
    pub fn compile_tree(&self, tree: Node) -> Result<CompileResult, CompileError> {
        let depth = tree.depth();
        if depth > self.config.max_depth {
            return Err(CompileError::TooDeep {
                depth,
                max_depth: self.config.max_depth,
            });
        }

        let joins = Joins.visit(&tree);
        let includes = Includes.visit(&tree);

        Ok(CompileResult {
            tree,
            joins,
            includes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Association, AssociationKind, AssociationRef, Attribute, AttributeRef, AttributeType};

    fn create_test_compiler() -> SearchCompiler {
        SearchCompiler::from_config(&SchemaConfig::default(), CompilerConfig::default()).unwrap()
    }

    #[test]
    fn test_attribute_search() {
        let compiler = create_test_compiler();
        let result = compiler.compile(r#"name:"x""#, "Host").unwrap();

        assert!(result.joins.is_empty());
        assert!(result.includes.is_empty());
    }

    #[test]
    fn test_association_search() {
        let compiler = create_test_compiler();
        let result = compiler.compile(r#"services.name:"x""#, "Host").unwrap();

        assert_eq!(result.join_names(), vec!["services"]);
        assert_eq!(result.include_names(), vec!["services"]);
    }

    #[test]
    fn test_repeated_operator_through_association() {
        let compiler = create_test_compiler();
        let result = compiler.compile("services.name:ssh services.name:http", "Host").unwrap();

        assert_eq!(result.join_names(), vec!["services"]);
        assert_eq!(result.include_names(), vec!["services"]);
    }

    #[test]
    fn test_mixed_search() {
        let compiler = create_test_compiler();
        let result = compiler
            .compile("name:web01 vulns.name:ms08-067 services.port:445", "Host")
            .unwrap();

        assert_eq!(result.join_names(), vec!["vulns", "services"]);
        assert_eq!(result.include_names(), vec!["vulns", "services"]);
    }

    #[test]
    fn test_unquoted_values_containing_colons() {
        let compiler = create_test_compiler();
        let result = compiler
            .compile("address:fe80::1 services.info:http://x name:a:b", "Host")
            .unwrap();

        assert_eq!(result.join_names(), vec!["services"]);
        assert_eq!(result.include_names(), vec!["services"]);
    }

    #[test]
    fn test_union_operator_is_attribute_only() {
        let compiler = create_test_compiler();
        let result = compiler.compile("os:linux", "Host").unwrap();
        assert!(result.joins.is_empty());
    }

    #[test]
    fn test_union_of_intersections_keeps_shared_association() {
        let compiler = create_test_compiler();
        let shared = AssociationRef::new(Association::new("Host", "shared", "Service", AssociationKind::HasMany));
        let a1 = AssociationRef::new(Association::new("Host", "a1", "Service", AssociationKind::HasMany));
        let a2 = AssociationRef::new(Association::new("Host", "a2", "Service", AssociationKind::HasMany));
        let port: AttributeRef = Attribute::new("Service", "port", AttributeType::Integer).into();

        let leaf = |association: &AssociationRef| Node::association(association.clone(), port.clone());
        let tree = Node::Union(vec![
            Node::Intersection(vec![leaf(&a1), leaf(&shared)]),
            Node::Intersection(vec![leaf(&a2), leaf(&shared)]),
        ]);

        let result = compiler.compile_tree(tree).unwrap();
        assert_eq!(result.join_names(), vec!["shared"]);
        assert_eq!(result.include_names(), vec!["shared"]);
    }

    #[test]
    fn test_depth_limit() {
        let compiler = SearchCompiler::from_config(
            &SchemaConfig::default(),
            CompilerConfig { max_depth: 3 },
        )
        .unwrap();

        let mut tree = Node::Intersection(vec![]);
        for _ in 0..3 {
            tree = Node::Union(vec![tree]);
        }

        assert_eq!(compiler.config().max_depth, 3);
        let err = compiler.compile_tree(tree).unwrap_err();
        assert_eq!(err, CompileError::TooDeep { depth: 4, max_depth: 3 });

        // a parsed search is Intersection > Union > Operation > operator
        assert!(compiler.compile("services.name:ssh", "Host").is_err());
        assert!(compiler.compile("", "Host").is_ok());
    }

    #[test]
    fn test_resolve_error_fails_closed() {
        let compiler = create_test_compiler();
        let err = compiler.compile("services.nope:1", "Host").unwrap_err();
        assert_eq!(
            err,
            CompileError::Resolve(ResolveError::UnknownOperator {
                model: "Service".to_string(),
                name: "nope".to_string(),
            })
        );
        assert_eq!(err.to_string(), "model 'Service' has no search operator 'nope'");
    }

    #[test]
    fn test_unknown_model() {
        let compiler = create_test_compiler();
        assert!(matches!(
            compiler.compile("name:x", "Nope"),
            Err(CompileError::Resolve(ResolveError::UnknownModel { .. }))
        ));
    }
}
