//! Resource descriptors and the dependency graph they are declared into.
//!
//! Nothing here talks to the cloud. A [`ResourceGraph`] is an in-memory
//! record of what should exist and in which order; an external
//! provisioning engine interprets it later. Dependency edges must be
//! registered explicitly, the graph does not infer them from name
//! references inside descriptors.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors related to graph declaration
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Resource already declared: {0}")]
    Duplicate(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// A single allow-statement attached to a role or function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

impl PolicyStatement {
    pub fn new<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }
}

/// Container backing a declared model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDefinition {
    pub image: String,
    pub environment: BTreeMap<String, String>,
}

/// The single weighted variant served by an endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionVariant {
    pub model_name: String,
    pub variant_name: String,
    pub instance_type: String,
    pub initial_instance_count: u32,
    pub initial_variant_weight: f32,
}

/// Descriptors for every resource the stack declares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resource {
    /// Identity principal assumed by the managed inference service
    ExecutionRole {
        name: String,
        assumed_by: String,
        policy: PolicyStatement,
    },
    /// Model backed by one inference container
    Model {
        name: String,
        execution_role_arn: String,
        container: ContainerDefinition,
    },
    /// Instance configuration an endpoint is provisioned from
    EndpointConfig {
        name: String,
        variant: ProductionVariant,
    },
    /// The externally invocable inference endpoint
    Endpoint {
        name: String,
        endpoint_config_name: String,
    },
    /// Compute function proxying HTTP requests to the endpoint
    Function {
        name: String,
        asset_path: String,
        handler: String,
        runtime: String,
        timeout_secs: u64,
        environment: BTreeMap<String, String>,
        policy: Vec<PolicyStatement>,
    },
    /// Public HTTP entry point bound to a function
    RestApi {
        name: String,
        handler_function: String,
        proxy: bool,
    },
}

impl Resource {
    /// The declared name of this resource
    pub fn name(&self) -> &str {
        match self {
            Resource::ExecutionRole { name, .. } => name,
            Resource::Model { name, .. } => name,
            Resource::EndpointConfig { name, .. } => name,
            Resource::Endpoint { name, .. } => name,
            Resource::Function { name, .. } => name,
            Resource::RestApi { name, .. } => name,
        }
    }
}

/// Relationship types between declared resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// Provisioning of the source must wait for the target
    DependsOn,
}

/// Directed graph of declared resources and their ordering constraints
pub struct ResourceGraph {
    graph: DiGraph<Resource, Relation>,
    name_index: HashMap<String, NodeIndex>,
}

impl ResourceGraph {
    /// Create a new empty resource graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_index: HashMap::new(),
        }
    }

    /// Declare a resource. Redeclaring a name is an error.
    pub fn declare(&mut self, resource: Resource) -> GraphResult<()> {
        let name = resource.name().to_string();
        if self.name_index.contains_key(&name) {
            return Err(GraphError::Duplicate(name));
        }
        let node = self.graph.add_node(resource);
        self.name_index.insert(name, node);
        Ok(())
    }

    /// Get a declared resource by name
    pub fn get(&self, name: &str) -> GraphResult<&Resource> {
        let node = self
            .name_index
            .get(name)
            .ok_or_else(|| GraphError::NotFound(name.to_string()))?;
        Ok(&self.graph[*node])
    }

    /// Record that `from` must be provisioned after `to`
    pub fn depends_on(&mut self, from: &str, to: &str) -> GraphResult<()> {
        let from_node = self
            .name_index
            .get(from)
            .ok_or_else(|| GraphError::NotFound(from.to_string()))?;
        let to_node = self
            .name_index
            .get(to)
            .ok_or_else(|| GraphError::NotFound(to.to_string()))?;
        self.graph.add_edge(*from_node, *to_node, Relation::DependsOn);
        Ok(())
    }

    /// Names of the resources `name` depends on
    pub fn dependencies_of(&self, name: &str) -> GraphResult<Vec<String>> {
        let node = self
            .name_index
            .get(name)
            .ok_or_else(|| GraphError::NotFound(name.to_string()))?;

        let mut dependencies = Vec::new();
        for edge in self.graph.edges(*node) {
            dependencies.push(self.graph[edge.target()].name().to_string());
        }
        Ok(dependencies)
    }

    /// All declared resources, in declaration order
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.graph.node_weights()
    }

    /// Query resources by a predicate function
    pub fn query<F>(&self, predicate: F) -> Vec<&Resource>
    where
        F: Fn(&Resource) -> bool,
    {
        self.graph
            .node_weights()
            .filter(|resource| predicate(resource))
            .collect()
    }

    /// Number of declared resources
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether anything has been declared yet
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of registered dependency edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for ResourceGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(name: &str, config: &str) -> Resource {
        Resource::Endpoint {
            name: name.to_string(),
            endpoint_config_name: config.to_string(),
        }
    }

    #[test]
    fn test_create_resource_graph() {
        let graph = ResourceGraph::new();
        assert_eq!(graph.len(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_declare_and_get() {
        let mut graph = ResourceGraph::new();
        graph.declare(endpoint("endpoint-a", "config-a")).unwrap();
        assert_eq!(graph.len(), 1);

        let retrieved = graph.get("endpoint-a").unwrap();
        assert_eq!(retrieved.name(), "endpoint-a");
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let mut graph = ResourceGraph::new();
        graph.declare(endpoint("endpoint-a", "config-a")).unwrap();

        let result = graph.declare(endpoint("endpoint-a", "config-b"));
        assert!(matches!(result, Err(GraphError::Duplicate(name)) if name == "endpoint-a"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_dependency_edges() {
        let mut graph = ResourceGraph::new();
        graph.declare(endpoint("endpoint-a", "config-a")).unwrap();
        graph.declare(endpoint("endpoint-b", "config-b")).unwrap();

        graph.depends_on("endpoint-b", "endpoint-a").unwrap();

        let deps = graph.dependencies_of("endpoint-b").unwrap();
        assert_eq!(deps, vec!["endpoint-a".to_string()]);
        assert!(graph.dependencies_of("endpoint-a").unwrap().is_empty());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_dependency_on_undeclared_resource() {
        let mut graph = ResourceGraph::new();
        graph.declare(endpoint("endpoint-a", "config-a")).unwrap();

        let result = graph.depends_on("endpoint-a", "ghost");
        assert!(matches!(result, Err(GraphError::NotFound(name)) if name == "ghost"));
    }

    #[test]
    fn test_query_resources() {
        let mut graph = ResourceGraph::new();
        graph.declare(endpoint("endpoint-a", "config-a")).unwrap();
        graph
            .declare(Resource::RestApi {
                name: "api".to_string(),
                handler_function: "fn".to_string(),
                proxy: true,
            })
            .unwrap();

        let apis = graph.query(|r| matches!(r, Resource::RestApi { .. }));
        assert_eq!(apis.len(), 1);
        assert_eq!(apis[0].name(), "api");
    }

    #[test]
    fn test_resource_not_found() {
        let graph = ResourceGraph::new();
        let result = graph.get("nonexistent");
        assert!(matches!(result, Err(GraphError::NotFound(name)) if name == "nonexistent"));
    }
}
