//! Static mapping from step identifier to step definition and factory,
//! built once at process start.

use crate::client::ContactClient;
use crate::step::{Step, StepFactory};
use crate::steps::{ContactFieldEquals, CreateContact, DeleteContact, DiscoverContact};
use cog_proto::StepDefinition;
use std::collections::HashMap;
use std::sync::Arc;

pub struct StepEntry {
    definition: fn() -> StepDefinition,
    factory: StepFactory,
}

impl StepEntry {
    pub fn definition(&self) -> StepDefinition {
        (self.definition)()
    }

    pub fn instantiate(&self, client: Arc<dyn ContactClient>) -> Box<dyn Step> {
        (self.factory)(client)
    }
}

#[derive(Default)]
pub struct StepRegistry {
    steps: HashMap<&'static str, StepEntry>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registry with every step this Cog supports.
    pub fn all_steps() -> Self {
        let mut registry = Self::new();
        registry.register(
            CreateContact::STEP_ID,
            CreateContact::definition,
            CreateContact::new,
        );
        registry.register(
            DeleteContact::STEP_ID,
            DeleteContact::definition,
            DeleteContact::new,
        );
        registry.register(
            DiscoverContact::STEP_ID,
            DiscoverContact::definition,
            DiscoverContact::new,
        );
        registry.register(
            ContactFieldEquals::STEP_ID,
            ContactFieldEquals::definition,
            ContactFieldEquals::new,
        );
        registry
    }

    pub fn register(
        &mut self,
        step_id: &'static str,
        definition: fn() -> StepDefinition,
        factory: StepFactory,
    ) {
        self.steps.insert(step_id, StepEntry { definition, factory });
    }

    pub fn get(&self, step_id: &str) -> Option<&StepEntry> {
        self.steps.get(step_id)
    }

    pub fn definitions(&self) -> Vec<StepDefinition> {
        let mut definitions: Vec<_> = self.steps.values().map(StepEntry::definition).collect();
        definitions.sort_by(|a, b| a.step_id.cmp(&b.step_id));
        definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_steps_enumerates_every_supported_step() {
        let registry = StepRegistry::all_steps();
        let ids: Vec<_> = registry
            .definitions()
            .iter()
            .map(|d| d.step_id.clone())
            .collect();
        assert_eq!(
            ids,
            vec![
                "ContactFieldEquals",
                "CreateContact",
                "DeleteContact",
                "DiscoverContact",
            ]
        );
        assert!(registry.get("CreateContact").is_some());
        assert!(registry.get("NotRealStep").is_none());
    }
}
