//! Reason-string interning: every destruction/vaccination reason is
//! compared case-insensitively elsewhere in the engine, so each distinct
//! reason string is interned into a small table on first declaration and
//! compared afterward as a plain integer.

use serde::{Deserialize, Serialize};

use crate::impl_from_primitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ReasonId(pub u16);
impl_from_primitive!(ReasonId, u16);

/// Case-insensitively interns reason strings declared by modules via
/// `DeclarationOf{Vaccination,Destruction}Reasons`.
#[derive(Debug, Clone, Default)]
pub struct ReasonTable {
    names: Vec<String>,
}

impl ReasonTable {
    pub fn intern(&mut self, reason: &str) -> ReasonId {
        if let Some(id) = self.lookup(reason) {
            return id;
        }
        self.names.push(reason.to_string());
        ReasonId((self.names.len() - 1) as u16)
    }

    pub fn lookup(&self, reason: &str) -> Option<ReasonId> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(reason))
            .map(|i| ReasonId(i as u16))
    }

    pub fn name(&self, id: ReasonId) -> &str {
        &self.names[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ReasonId> + '_ {
        (0..self.names.len() as u16).map(ReasonId)
    }
}

/// Reason codes every scenario declares at minimum.
pub mod well_known {
    pub const RING: &str = "Ring";
    pub const DIRECT_FORWARD: &str = "DirFwd";
    pub const INDIRECT_FORWARD: &str = "IndFwd";
    pub const DETECTION: &str = "Det";
    pub const TRACE: &str = "Tr";
    pub const INITIAL: &str = "Ini";
}
