//! Production-type interning.
//!
//! Production types ("cattle", "pigs", ...) index one axis of the scheduler's
//! sub-queues and the airborne model's per-source parameter blocks, so they
//! are interned to small integers the same way [`crate::reason::ReasonTable`]
//! interns reason strings.

use serde::{Deserialize, Serialize};

use crate::impl_from_primitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ProductionTypeId(pub u16);
impl_from_primitive!(ProductionTypeId, u16);

#[derive(Debug, Clone, Default)]
pub struct ProductionTypeRegistry {
    names: Vec<String>,
}

impl ProductionTypeRegistry {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, id: ProductionTypeId) -> &str {
        &self.names[id.0 as usize]
    }

    pub fn id_of(&self, name: &str) -> Option<ProductionTypeId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| ProductionTypeId(i as u16))
    }

    pub fn ids(&self) -> impl Iterator<Item = ProductionTypeId> + '_ {
        (0..self.names.len() as u16).map(ProductionTypeId)
    }
}
