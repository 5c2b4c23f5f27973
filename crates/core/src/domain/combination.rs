//! Combination state and the apply/capture engine
//!
//! A combination is a named, persistable snapshot of the on/off state of
//! the console elements listed by its template. Each state entry is a
//! tri-state: `Unset` means "not recorded by this combination", so recall
//! leaves the element untouched, while `Off` positively disengages it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use super::console::{ConsoleRegistry, ElementKind, ManualId};
use super::diagnostics::{Diagnostic, LoadDiagnostics};
use super::template::CombinationTemplate;

pub type Result<T> = std::result::Result<T, CombinationError>;

/// Structural errors; bad persisted data never ends up here, it is
/// reported through [`LoadDiagnostics`] instead
#[derive(Debug, Error)]
pub enum CombinationError {
    #[error("combinations are bound to different templates")]
    TemplateMismatch,
}

/// Per-element recorded state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriState {
    /// Not recorded; recall does not touch the element
    Unset,
    /// Recorded as disengaged; recall disengages the element
    Off,
    /// Recorded as engaged
    On,
}

/// Set of template positions, used for exclusion on recall
pub type ElementSet = HashSet<usize>;

/// How a capture decides which elements to record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Record every governed element as `On` or `Off`
    Regular,
    /// Record only engaged elements; everything else stays `Unset`
    Scope,
    /// Revisit only positions that are already recorded
    Scoped,
}

/// Active capture session: while one is running, recalling an unprotected
/// combination captures into it instead of restoring it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetterSession {
    pub mode: CaptureMode,
    /// Record elements that are hidden in the current configuration too
    pub store_invisible: bool,
}

/// One preset slot bound to a shared template
#[derive(Debug, Clone)]
pub struct Combination<'t> {
    template: &'t CombinationTemplate,
    state: Vec<TriState>,
    is_full: bool,
    protected: bool,
    group: String,
}

impl<'t> Combination<'t> {
    pub fn new(template: &'t CombinationTemplate, group: impl Into<String>) -> Self {
        Self {
            template,
            state: vec![TriState::Unset; template.len()],
            is_full: false,
            protected: false,
            group: group.into(),
        }
    }

    pub fn template(&self) -> &'t CombinationTemplate {
        self.template
    }

    /// Persistence group/section key used by both codecs
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Whether recall also disengages elements this combination does not
    /// mention
    pub fn is_full(&self) -> bool {
        self.is_full
    }

    pub fn set_full(&mut self, is_full: bool) {
        self.is_full = is_full;
    }

    /// A protected combination refuses to load new persisted state
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn set_protected(&mut self, protected: bool) {
        self.protected = protected;
    }

    pub fn state(&self) -> &[TriState] {
        &self.state
    }

    pub fn state_at(&self, position: usize) -> TriState {
        self.state
            .get(position)
            .copied()
            .unwrap_or(TriState::Unset)
    }

    /// Sets one entry directly (UI editing path)
    pub fn set_state_at(&mut self, position: usize, value: TriState) {
        self.sync_to_template();
        if let Some(entry) = self.state.get_mut(position) {
            *entry = value;
        }
    }

    /// Resets every entry to `Unset`
    pub fn clear(&mut self) {
        self.sync_to_template();
        self.state.fill(TriState::Unset);
        self.is_full = false;
    }

    /// Re-syncs the state array to the template size. Growth pads with
    /// `Unset`, shrink truncates; existing entries keep their positions.
    /// Idempotent, called before any indexed access.
    pub fn sync_to_template(&mut self) {
        self.state.resize(self.template.len(), TriState::Unset);
    }

    /// True iff no entry is `On`
    pub fn is_empty(&self) -> bool {
        !self.state.iter().any(|s| *s == TriState::On)
    }

    /// Copies another combination's state. Both must be bound to the same
    /// template instance; anything else is a caller bug.
    pub fn copy_from(&mut self, other: &Combination<'t>) -> Result<()> {
        if !std::ptr::eq(self.template, other.template) {
            return Err(CombinationError::TemplateMismatch);
        }
        self.state = other.state.clone();
        self.sync_to_template();
        Ok(())
    }

    /// Shared assignment path for both codecs: resolves the element within
    /// the template and records it, first write wins.
    pub(crate) fn set_loaded_state(
        &mut self,
        kind: ElementKind,
        manual: Option<ManualId>,
        number: u32,
        engaged: bool,
        entry: &str,
        diagnostics: &mut LoadDiagnostics,
    ) {
        self.sync_to_template();
        match self.template.find_position(kind, manual, number) {
            Some(position) => {
                if self.state[position] == TriState::Unset {
                    self.state[position] = if engaged { TriState::On } else { TriState::Off };
                } else {
                    diagnostics.push(Diagnostic::DuplicateEntry {
                        group: self.group.clone(),
                        entry: entry.to_string(),
                    });
                }
            }
            None => diagnostics.push(Diagnostic::InvalidEntry {
                group: self.group.clone(),
                entry: entry.to_string(),
            }),
        }
    }

    /// Captures the live console into this combination.
    ///
    /// Returns true iff at least one position ended `On`.
    pub fn fill_with_current(
        &mut self,
        registry: &dyn ConsoleRegistry,
        mode: CaptureMode,
        store_invisible: bool,
    ) -> bool {
        self.sync_to_template();
        self.is_full = store_invisible;
        let template = self.template;
        let mut used = false;

        for (position, element) in template.elements().iter().enumerate() {
            match mode {
                CaptureMode::Regular | CaptureMode::Scope => {
                    if !store_invisible && !element.store_unconditional {
                        self.state[position] = TriState::Unset;
                    } else if registry.is_engaged(element.kind, element.manual, element.number) {
                        self.state[position] = TriState::On;
                        used = true;
                    } else {
                        // Scope records differences from the baseline only,
                        // so a non-engaged element stays unrecorded
                        self.state[position] = match mode {
                            CaptureMode::Regular => TriState::Off,
                            _ => TriState::Unset,
                        };
                    }
                }
                CaptureMode::Scoped => {
                    if self.state[position] != TriState::Unset {
                        if registry.is_engaged(element.kind, element.manual, element.number) {
                            self.state[position] = TriState::On;
                            used = true;
                        } else {
                            self.state[position] = TriState::Off;
                        }
                    }
                }
            }
        }
        debug!(group = %self.group, ?mode, used, "captured combination");
        used
    }

    /// Recalls this combination, or captures into it while a setter
    /// session is active.
    ///
    /// On recall, every recorded position not listed in `excluded` is
    /// pushed into the live console. Returns true iff any pushed (or
    /// captured) element was `On`.
    pub fn push_local(
        &mut self,
        registry: &mut dyn ConsoleRegistry,
        setter: Option<&SetterSession>,
        excluded: Option<&ElementSet>,
    ) -> bool {
        if let Some(session) = setter {
            if self.protected {
                return false;
            }
            return self.fill_with_current(registry, session.mode, session.store_invisible);
        }

        self.sync_to_template();
        let template = self.template;
        let mut used = false;
        for (position, element) in template.elements().iter().enumerate() {
            let state = self.state[position];
            if state == TriState::Unset {
                continue;
            }
            if excluded.is_some_and(|set| set.contains(&position)) {
                continue;
            }
            registry.set_engaged(
                element.kind,
                element.manual,
                element.number,
                state == TriState::On,
            );
            used |= state == TriState::On;
        }
        debug!(group = %self.group, used, "recalled combination");
        used
    }

    /// Positions recorded `Off` whose live element is currently engaged.
    /// Hosts use this as the exclusion set for cumulative recall.
    pub fn extra_engaged_elements(&self, registry: &dyn ConsoleRegistry) -> ElementSet {
        self.template
            .elements()
            .iter()
            .zip(&self.state)
            .enumerate()
            .filter(|(_, (element, state))| {
                **state == TriState::Off
                    && registry.is_engaged(element.kind, element.manual, element.number)
            })
            .map(|(position, _)| position)
            .collect()
    }

    /// Positions recorded `On`
    pub fn enabled_elements(&self) -> ElementSet {
        self.state
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == TriState::On)
            .map(|(position, _)| position)
            .collect()
    }
}
