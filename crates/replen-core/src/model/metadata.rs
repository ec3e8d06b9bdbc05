//! Names and JSON metadata attached to variables, constraints and the objective.
//!
//! Names are how inventory rows are addressed from outside the builder
//! (`balance[W1,3]`), so lookups by name are exact string matches.

use std::collections::BTreeMap;

use replen_expr::ids::{ConstraintId, VariableId};

use crate::model::Model;
use crate::model::error::ModelError;

fn insert<K: Ord, V>(slot: &mut Option<BTreeMap<K, V>>, key: K, value: V) {
    slot.get_or_insert_with(BTreeMap::new).insert(key, value);
}

fn find_by_name<K: Copy>(slot: &Option<BTreeMap<K, String>>, name: &str) -> Option<K> {
    slot.as_ref()?
        .iter()
        .find_map(|(key, value)| (value == name).then_some(*key))
}

impl Model {
    pub fn set_variable_name(&mut self, id: VariableId, name: String) -> Result<(), ModelError> {
        self.ensure_variable_exists(id)?;
        insert(&mut self.variable_names, id, name);
        Ok(())
    }

    pub fn get_variable_name(&self, id: VariableId) -> Option<&str> {
        self.variable_names.as_ref()?.get(&id).map(String::as_str)
    }

    pub fn get_variable_by_name(&self, name: &str) -> Option<VariableId> {
        find_by_name(&self.variable_names, name)
    }

    /// Attach metadata such as `{"family": "inventory", "entity": "W1", "period": 3}`.
    pub fn set_variable_metadata(
        &mut self,
        id: VariableId,
        metadata: serde_json::Value,
    ) -> Result<(), ModelError> {
        self.ensure_variable_exists(id)?;
        insert(&mut self.variable_metadata, id, metadata);
        Ok(())
    }

    pub fn get_variable_metadata(&self, id: VariableId) -> Option<&serde_json::Value> {
        self.variable_metadata.as_ref()?.get(&id)
    }

    pub fn set_constraint_name(
        &mut self,
        id: ConstraintId,
        name: String,
    ) -> Result<(), ModelError> {
        self.ensure_constraint_exists(id)?;
        insert(&mut self.constraint_names, id, name);
        Ok(())
    }

    pub fn get_constraint_name(&self, id: ConstraintId) -> Option<&str> {
        self.constraint_names.as_ref()?.get(&id).map(String::as_str)
    }

    pub fn get_constraint_by_name(&self, name: &str) -> Option<ConstraintId> {
        find_by_name(&self.constraint_names, name)
    }

    pub fn set_constraint_metadata(
        &mut self,
        id: ConstraintId,
        metadata: serde_json::Value,
    ) -> Result<(), ModelError> {
        self.ensure_constraint_exists(id)?;
        insert(&mut self.constraint_metadata, id, metadata);
        Ok(())
    }

    pub fn get_constraint_metadata(&self, id: ConstraintId) -> Option<&serde_json::Value> {
        self.constraint_metadata.as_ref()?.get(&id)
    }

    pub fn set_objective_name(&mut self, name: Option<String>) {
        self.objective_name = name;
    }

    pub fn get_objective_name(&self) -> Option<&str> {
        self.objective_name.as_deref()
    }
}
