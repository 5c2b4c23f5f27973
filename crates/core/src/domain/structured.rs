//! Structured tree codec and name/number reconciler
//!
//! The structured form stores, per `(kind, manual)` scope, a map from the
//! element's zero-padded 3-digit number at save time to its name at save
//! time. Between save and load the instrument may have been revised:
//! elements renumbered, renamed, or removed. Loading therefore re-matches
//! every entry against the live registry, best effort, preferring an exact
//! number+name match, then a name match (wrong-number drift), then a number
//! match (wrong-name drift), and dropping entries that match neither.
//!
//! Only engaged elements are recorded in this form. After decoding, a
//! post-pass promotes still-`Unset` positions to `Off` when the
//! combination is full or the element must always be governed, so that
//! recall positively disengages them.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::combination::{Combination, TriState};
use super::console::{ConsoleRegistry, ElementKind, ManualId};
use super::diagnostics::{Diagnostic, LoadDiagnostics};

const FULL: &str = "full";
const MANUALS: &str = "manuals";

fn serial_key(number: u32) -> Value {
    Value::String(format!("{number:03}"))
}

fn manual_key(manual: ManualId) -> Value {
    Value::String(format!("{:02}", manual.get()))
}

/// Looks a key up as a string, falling back to the bare integer form a
/// hand-edited file may use
fn get_entry<'a>(map: &'a Mapping, text: Value, number: u64) -> Option<&'a Value> {
    map.get(&text)
        .or_else(|| map.get(&Value::Number(number.into())))
}

fn scope_section<'a>(
    root: &'a Mapping,
    kind: ElementKind,
    manual: Option<ManualId>,
) -> Option<&'a Mapping> {
    let host = match manual {
        Some(manual) => get_entry(
            root.get(MANUALS)?.as_mapping()?,
            manual_key(manual),
            manual.get() as u64,
        )?
        .as_mapping()?,
        None => root,
    };
    host.get(kind.section())?.as_mapping()
}

impl Combination<'_> {
    /// Encodes the combination as a structured tree. Empty combinations
    /// encode as null.
    pub fn to_tree(&self, registry: &dyn ConsoleRegistry) -> Value {
        let template = self.template();
        let mut root = Mapping::new();
        let mut manuals: Vec<(ManualId, Mapping)> = Vec::new();

        for (kind, manual) in template.scopes() {
            let mut section = Mapping::new();
            for (position, element) in template.elements().iter().enumerate() {
                if (element.kind, element.manual) != (kind, manual)
                    || self.state_at(position) != TriState::On
                {
                    continue;
                }
                if let Some(name) = registry.element_name(kind, manual, element.number) {
                    section.insert(serial_key(element.number), Value::String(name));
                }
            }
            if section.is_empty() {
                continue;
            }
            let section_key = Value::String(kind.section().into());
            match manual {
                Some(manual) => match manuals.iter_mut().find(|(id, _)| *id == manual) {
                    Some((_, sections)) => {
                        sections.insert(section_key, Value::Mapping(section));
                    }
                    None => {
                        let mut sections = Mapping::new();
                        sections.insert(section_key, Value::Mapping(section));
                        manuals.push((manual, sections));
                    }
                },
                None => {
                    root.insert(section_key, Value::Mapping(section));
                }
            }
        }

        if !manuals.is_empty() {
            let mut node = Mapping::new();
            for (manual, sections) in manuals {
                node.insert(manual_key(manual), Value::Mapping(sections));
            }
            let mut with_manuals = Mapping::new();
            with_manuals.insert(Value::String(MANUALS.into()), Value::Mapping(node));
            for (key, value) in root {
                with_manuals.insert(key, value);
            }
            root = with_manuals;
        }

        if root.is_empty() {
            return Value::Null;
        }
        if self.is_full() {
            root.insert(Value::String(FULL.into()), Value::Bool(true));
        }
        Value::Mapping(root)
    }

    /// Decodes the structured tree, reconciling drifted entries against
    /// the live registry. A protected combination is left untouched.
    pub fn from_tree(
        &mut self,
        node: &Value,
        registry: &dyn ConsoleRegistry,
        diagnostics: &mut LoadDiagnostics,
    ) {
        if self.is_protected() {
            return;
        }
        self.clear();
        let Some(root) = node.as_mapping() else {
            return;
        };

        let template = self.template();
        for (kind, manual) in template.scopes() {
            if let Some(section) = scope_section(root, kind, manual) {
                self.reconcile_section(section, kind, manual, registry, diagnostics);
            }
        }

        self.set_full(
            root.get(FULL)
                .and_then(Value::as_bool)
                .unwrap_or(false),
        );

        // Promote unmentioned positions to Off where the combination must
        // positively disengage them on recall.
        let is_full = self.is_full();
        for position in 0..template.len() {
            if self.state_at(position) == TriState::Unset
                && (is_full || template.elements()[position].store_unconditional)
            {
                self.set_state_at(position, TriState::Off);
            }
        }
        debug!(group = %self.group(), "loaded structured combination");
    }

    fn reconcile_section(
        &mut self,
        section: &Mapping,
        kind: ElementKind,
        manual: Option<ManualId>,
        registry: &dyn ConsoleRegistry,
        diagnostics: &mut LoadDiagnostics,
    ) {
        let max = registry.element_count(kind, manual) as i64;

        for (key, value) in section {
            let serial = match key {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                _ => continue,
            };
            let saved_name = value.as_str().unwrap_or_default();
            let saved_number: i64 = serial.trim().parse().unwrap_or(0);
            let number_valid = saved_number >= 1 && saved_number <= max;
            let live_name = if number_valid {
                registry.element_name(kind, manual, saved_number as u32)
            } else {
                None
            };

            let resolved = if live_name.as_deref() == Some(saved_name) {
                // nothing drifted
                Some(saved_number as u32)
            } else if let Some(found) = registry.find_by_name(kind, manual, saved_name) {
                if number_valid {
                    diagnostics.push(Diagnostic::WrongNumber {
                        kind,
                        name: saved_name.to_string(),
                        expected: saved_number as u32,
                        found,
                    });
                }
                Some(found)
            } else if number_valid {
                diagnostics.push(Diagnostic::WrongName {
                    kind,
                    number: saved_number as u32,
                    saved: saved_name.to_string(),
                    live: live_name.clone().unwrap_or_default(),
                });
                Some(saved_number as u32)
            } else {
                diagnostics.push(Diagnostic::Unmatched {
                    kind,
                    serial,
                    name: saved_name.to_string(),
                });
                None
            };

            if let Some(number) = resolved {
                // the live name is authoritative from here on
                let entry = registry
                    .element_name(kind, manual, number)
                    .unwrap_or_else(|| saved_name.to_string());
                self.set_loaded_state(kind, manual, number, true, &entry, diagnostics);
            }
        }
    }
}
