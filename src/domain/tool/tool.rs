//! Tool - A named capability with schema, annotations, and handler.

use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use crate::domain::foundation::ValidationError;
use crate::ports::ToolHandler;

use super::Annotations;

/// A named capability the planner can invoke.
///
/// Immutable after construction; identity is the name. Input and output
/// schemas are opaque JSON documents validated by the tool itself.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    input_schema: Option<JsonValue>,
    output_schema: Option<JsonValue>,
    annotations: Annotations,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Creates a tool with default annotations.
    ///
    /// Fails if the name is blank; names are stable identifiers.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::blank("tool name"));
        }
        Ok(Self {
            name,
            description: description.into(),
            input_schema: None,
            output_schema: None,
            annotations: Annotations::default(),
            handler,
        })
    }

    /// Sets the annotations.
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Sets the input schema document.
    pub fn with_input_schema(mut self, schema: JsonValue) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Sets the output schema document.
    pub fn with_output_schema(mut self, schema: JsonValue) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Returns the tool's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema, if declared.
    pub fn input_schema(&self) -> Option<&JsonValue> {
        self.input_schema.as_ref()
    }

    /// Returns the output schema, if declared.
    pub fn output_schema(&self) -> Option<&JsonValue> {
        self.output_schema.as_ref()
    }

    /// Returns the behavioral annotations.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Returns the handler.
    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("annotations", &self.annotations)
            .finish()
    }
}

impl PartialEq for Tool {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tool {}
