//! Tool registry - Unique-name repository of tools.
//!
//! The registry is shared and read-only during execution: the engine takes
//! an `Arc<ToolRegistry>` at construction and never registers afterwards.

use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use super::Tool;

/// Errors from registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A tool with the same name is already registered.
    #[error("duplicate tool: {0}")]
    DuplicateTool(String),

    /// No tool with the given name exists.
    #[error("tool not found: {0}")]
    ToolNotFound(String),
}

/// Thread-safe mapping from tool name to tool.
///
/// Names are globally unique within a registry; registering a duplicate
/// fails rather than overwriting.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Tool>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a tool, failing if the name already exists.
    pub fn register(&self, tool: Tool) -> Result<(), RegistryError> {
        let mut tools = self
            .tools
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if tools.contains_key(tool.name()) {
            return Err(RegistryError::DuplicateTool(tool.name().to_string()));
        }
        tools.insert(tool.name().to_string(), tool);
        Ok(())
    }

    /// Looks up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<Tool, RegistryError> {
        self.tools
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))
    }

    /// Returns true if a tool with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(name)
    }

    /// Returns a snapshot of registered tool names, sorted for determinism.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
