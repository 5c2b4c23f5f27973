//! Console element abstractions and the live device registry
//!
//! This module defines the registry interface the combination engine talks
//! to. The real console (organ definition, MIDI bindings, window glue) lives
//! outside this crate; `ConsoleModel` is the in-memory implementation used
//! by hosts that assemble an instrument programmatically and by tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind of a controllable console element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Stop,
    Coupler,
    Tremulant,
    Switch,
    DivisionalCoupler,
}

impl ElementKind {
    /// Human-readable label used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Stop => "stop",
            ElementKind::Coupler => "coupler",
            ElementKind::Tremulant => "tremulant",
            ElementKind::Switch => "switch",
            ElementKind::DivisionalCoupler => "divisional coupler",
        }
    }

    /// Section key of this kind in the structured tree form
    pub fn section(&self) -> &'static str {
        match self {
            ElementKind::Stop => "stops",
            ElementKind::Coupler => "couplers",
            ElementKind::Tremulant => "tremulants",
            ElementKind::Switch => "switches",
            ElementKind::DivisionalCoupler => "divisional-couplers",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identifier of a keyboard/division on the console
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ManualId(u32);

impl ManualId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ManualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Live device registry consumed by the combination engine.
///
/// Element numbers are 1-based within a `(kind, manual)` scope; instrument
/// wide kinds use `manual = None`. One polymorphic interface replaces the
/// per-kind lookup calls a console would otherwise expose.
pub trait ConsoleRegistry {
    /// Number of live elements within the scope
    fn element_count(&self, kind: ElementKind, manual: Option<ManualId>) -> u32;

    /// Current display name of the element at `number`, if it exists
    fn element_name(
        &self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
    ) -> Option<String>;

    /// Number of the element whose current name equals `name`
    fn find_by_name(
        &self,
        kind: ElementKind,
        manual: Option<ManualId>,
        name: &str,
    ) -> Option<u32>;

    /// Whether the element is currently engaged (drawn/active)
    fn is_engaged(&self, kind: ElementKind, manual: Option<ManualId>, number: u32) -> bool;

    /// Engage or disengage the element
    fn set_engaged(
        &mut self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
        engaged: bool,
    );
}

#[derive(Debug, Clone)]
struct ConsoleElement {
    name: String,
    engaged: bool,
}

/// In-memory console registry
#[derive(Debug, Clone, Default)]
pub struct ConsoleModel {
    scopes: HashMap<(ElementKind, Option<ManualId>), Vec<ConsoleElement>>,
}

impl ConsoleModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element to a scope and returns its 1-based number
    pub fn add_element(
        &mut self,
        kind: ElementKind,
        manual: Option<ManualId>,
        name: &str,
    ) -> u32 {
        let scope = self.scopes.entry((kind, manual)).or_default();
        scope.push(ConsoleElement {
            name: name.to_string(),
            engaged: false,
        });
        scope.len() as u32
    }

    /// Renames an element; returns false if it does not exist
    pub fn rename(
        &mut self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
        name: &str,
    ) -> bool {
        match self.element_mut(kind, manual, number) {
            Some(element) => {
                element.name = name.to_string();
                true
            }
            None => false,
        }
    }

    fn element(
        &self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
    ) -> Option<&ConsoleElement> {
        let scope = self.scopes.get(&(kind, manual))?;
        number
            .checked_sub(1)
            .and_then(|index| scope.get(index as usize))
    }

    fn element_mut(
        &mut self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
    ) -> Option<&mut ConsoleElement> {
        let scope = self.scopes.get_mut(&(kind, manual))?;
        number
            .checked_sub(1)
            .and_then(|index| scope.get_mut(index as usize))
    }
}

impl ConsoleRegistry for ConsoleModel {
    fn element_count(&self, kind: ElementKind, manual: Option<ManualId>) -> u32 {
        self.scopes
            .get(&(kind, manual))
            .map_or(0, |scope| scope.len() as u32)
    }

    fn element_name(
        &self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
    ) -> Option<String> {
        self.element(kind, manual, number)
            .map(|element| element.name.clone())
    }

    fn find_by_name(
        &self,
        kind: ElementKind,
        manual: Option<ManualId>,
        name: &str,
    ) -> Option<u32> {
        let scope = self.scopes.get(&(kind, manual))?;
        scope
            .iter()
            .position(|element| element.name == name)
            .map(|index| index as u32 + 1)
    }

    fn is_engaged(&self, kind: ElementKind, manual: Option<ManualId>, number: u32) -> bool {
        self.element(kind, manual, number)
            .is_some_and(|element| element.engaged)
    }

    fn set_engaged(
        &mut self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
        engaged: bool,
    ) {
        if let Some(element) = self.element_mut(kind, manual, number) {
            element.engaged = engaged;
        }
    }
}
