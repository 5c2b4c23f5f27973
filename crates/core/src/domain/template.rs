//! Combination template: the ordered list of element slots a combination's
//! state is indexed against
//!
//! A template is built once per instrument load and shared read-only by
//! every combination of the same shape (all divisionals of one manual, the
//! generals, and so on). Combinations borrow it; it is never mutated after
//! construction.

use serde::{Deserialize, Serialize};

use super::console::{ElementKind, ManualId};

/// One element slot within a combination template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDefinition {
    pub kind: ElementKind,
    /// Owning keyboard/division; `None` for instrument-wide kinds
    pub manual: Option<ManualId>,
    /// 1-based position within the `(kind, manual)` scope
    pub number: u32,
    /// 1-based serial over the whole template, the default legacy
    /// persistence key
    pub display_index: u32,
    /// Record this element even when it is hidden in the current
    /// instrument configuration
    pub store_unconditional: bool,
}

/// Shared, ordered list of element slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationTemplate {
    elements: Vec<ElementDefinition>,
}

impl CombinationTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot; display indices are assigned serially in insertion
    /// order
    pub fn add(
        &mut self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
        store_unconditional: bool,
    ) {
        let display_index = self.elements.len() as u32 + 1;
        self.elements.push(ElementDefinition {
            kind,
            manual,
            number,
            display_index,
            store_unconditional,
        });
    }

    /// Appends one slot per element of a whole scope, numbered `1..=count`
    pub fn add_scope(
        &mut self,
        kind: ElementKind,
        manual: Option<ManualId>,
        count: u32,
        store_unconditional: bool,
    ) {
        for number in 1..=count {
            self.add(kind, manual, number, store_unconditional);
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[ElementDefinition] {
        &self.elements
    }

    pub fn get(&self, position: usize) -> Option<&ElementDefinition> {
        self.elements.get(position)
    }

    /// Template position of the element addressed by scope and number
    pub fn find_position(
        &self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
    ) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| e.kind == kind && e.manual == manual && e.number == number)
    }

    /// Template position of the element carrying `display_index`
    pub fn by_display_index(&self, display_index: u32) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| e.display_index == display_index)
    }

    /// Ordered distinct `(kind, manual)` scopes covered by this template
    pub fn scopes(&self) -> Vec<(ElementKind, Option<ManualId>)> {
        let mut scopes = Vec::new();
        for element in &self.elements {
            let scope = (element.kind, element.manual);
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        scopes
    }
}
