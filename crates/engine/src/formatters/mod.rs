//! Formatter registry used by `%{...}` template markers.
//!
//! Formatters live in a tree addressed by dotted paths (`aws.userData`,
//! `base64`). Leaves are string-producing functions; inner nodes are
//! namespaces. The registry starts with the built-ins from [`builtin`] and can
//! be extended programmatically or from an override file (see [`overrides`]).

pub mod builtin;
pub mod overrides;

use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::error::EngineError;

pub use overrides::{formatters_from_value, load_formatter_overrides};

/// A formatter function: receives the marker's arguments, returns the replacement text.
pub type FormatterFn = Arc<dyn Fn(&[String]) -> anyhow::Result<String> + Send + Sync>;

/// A node in the formatter tree.
#[derive(Clone)]
pub enum FormatterNode {
    Leaf(FormatterFn),
    Namespace(FormatterRegistry),
}

/// Dot-namespaced tree of formatter functions.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    nodes: IndexMap<String, FormatterNode>,
}

impl FormatterRegistry {
    /// Creates an empty registry without built-ins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with `base64`, `keyGen`, `script` and `script64`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::install(&mut registry);
        registry
    }

    /// Registers `function` at the dotted `path`, creating namespaces on the way.
    ///
    /// Whatever previously lived at `path` is replaced, and a leaf standing where
    /// a namespace is needed is replaced by that namespace.
    pub fn register<F>(&mut self, path: &str, function: F)
    where
        F: Fn(&[String]) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.insert_node(path, FormatterNode::Leaf(Arc::new(function)));
    }

    /// Inserts a leaf or a whole namespace at the dotted `path`.
    pub fn insert_node(&mut self, path: &str, node: FormatterNode) {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = self;
        for segment in segments {
            let entry = current
                .nodes
                .entry(segment.to_string())
                .or_insert_with(|| FormatterNode::Namespace(FormatterRegistry::new()));
            if matches!(entry, FormatterNode::Leaf(_)) {
                *entry = FormatterNode::Namespace(FormatterRegistry::new());
            }
            let FormatterNode::Namespace(namespace) = entry else {
                return;
            };
            current = namespace;
        }
        current.nodes.insert(last.to_string(), node);
    }

    /// Deep-merges `other` over this registry.
    ///
    /// Namespaces present on both sides merge recursively; any other collision
    /// is won by `other`.
    pub fn merge(&mut self, other: FormatterRegistry) {
        for (name, incoming) in other.nodes {
            match (self.nodes.get_mut(&name), incoming) {
                (Some(FormatterNode::Namespace(existing)), FormatterNode::Namespace(incoming)) => existing.merge(incoming),
                (_, incoming) => {
                    self.nodes.insert(name, incoming);
                }
            }
        }
    }

    /// Walks the dotted `path` and returns the leaf function stored there.
    pub fn lookup(&self, path: &str) -> Result<&FormatterFn, EngineError> {
        let unknown = || EngineError::UnknownFormatter { path: path.to_string() };

        let mut current = self;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            match current.nodes.get(segment) {
                Some(FormatterNode::Leaf(function)) if segments.peek().is_none() => return Ok(function),
                Some(FormatterNode::Namespace(namespace)) if segments.peek().is_some() => current = namespace,
                _ => return Err(unknown()),
            }
        }
        Err(unknown())
    }

    /// Looks up and invokes the formatter at `path`.
    pub fn call(&self, path: &str, args: &[String]) -> Result<String, EngineError> {
        let function = self.lookup(path)?;
        function(args).map_err(|source| EngineError::FormatterFailed {
            path: path.to_string(),
            source,
        })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_ok()
    }

    /// Dotted paths of every leaf, depth first in insertion order.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names("", &mut names);
        names
    }

    fn collect_names(&self, prefix: &str, names: &mut Vec<String>) {
        for (name, node) in &self.nodes {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            match node {
                FormatterNode::Leaf(_) => names.push(path),
                FormatterNode::Namespace(namespace) => namespace.collect_names(&path, names),
            }
        }
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry").field("formatters", &self.names()).finish()
    }
}
