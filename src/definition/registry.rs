use std::collections::HashMap;

use super::errors::DefinitionError;
use super::types::{FlowDefinition, FlowId};

/// Read-only lookup of flow templates, consumed by the planner.
///
/// Definitions are authored out of band; the engine never mutates them.
pub trait FlowDefinitionStore: Send + Sync + 'static {
    fn get(&self, flow_id: &str) -> Option<FlowDefinition>;
}

/// In-memory registry of flow definitions, keyed by flow id.
pub struct InMemoryFlowRegistry {
    flows: HashMap<FlowId, FlowDefinition>,
}

impl InMemoryFlowRegistry {
    pub fn new() -> Self {
        Self {
            flows: HashMap::new(),
        }
    }

    pub fn register(&mut self, definition: FlowDefinition) -> Result<(), DefinitionError> {
        if self.flows.contains_key(&definition.flow_id) {
            return Err(DefinitionError::DuplicateFlow(definition.flow_id));
        }
        tracing::debug!(
            "Registered flow definition: {} ({})",
            definition.flow_id,
            definition.slug
        );
        self.flows.insert(definition.flow_id.clone(), definition);
        Ok(())
    }
}

impl Default for InMemoryFlowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowDefinitionStore for InMemoryFlowRegistry {
    fn get(&self, flow_id: &str) -> Option<FlowDefinition> {
        self.flows.get(flow_id).cloned()
    }
}
