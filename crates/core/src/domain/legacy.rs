//! Legacy flat key-value codec
//!
//! The historical persistence form: one `NumberOfStops` count, one `IsFull`
//! boolean and up to `count` sign-tagged display indices under the
//! combination's group. The sign trick (`-(display_index) - 1` for an
//! explicitly recorded `Off`) is confined to this module; the in-memory
//! model only ever sees [`TriState`].

use tracing::debug;

use super::combination::{Combination, TriState};
use super::diagnostics::{Diagnostic, LoadDiagnostics};
use super::settings::{SettingSource, SettingsReader, SettingsWriter};

const NUMBER_OF_STOPS: &str = "NumberOfStops";
const IS_FULL: &str = "IsFull";

/// Upper bound used by the existence probe, before the template size is
/// known
const PROBE_MAX: i32 = 999;

fn entry_key(serial: usize) -> String {
    format!("Stop{serial:03}")
}

fn read_entry_count(
    reader: &dyn SettingsReader,
    source: SettingSource,
    group: &str,
    max: i32,
    required: bool,
) -> i32 {
    reader.read_integer(
        source,
        group,
        NUMBER_OF_STOPS,
        0,
        max,
        required,
        if required { 0 } else { -1 },
    )
}

fn source_on_file(reader: &dyn SettingsReader, source: SettingSource, group: &str) -> bool {
    read_entry_count(reader, source, group, PROBE_MAX, false) >= 0
}

impl Combination<'_> {
    /// Whether either settings source holds a combination under `group`
    pub fn is_on_file(reader: &dyn SettingsReader, group: &str) -> bool {
        source_on_file(reader, SettingSource::User, group)
            || source_on_file(reader, SettingSource::Instrument, group)
    }

    /// Loads from whichever source has this combination on file, the user
    /// override store first. Returns false if neither has it; the state is
    /// cleared either way.
    pub fn load_legacy(
        &mut self,
        reader: &dyn SettingsReader,
        diagnostics: &mut LoadDiagnostics,
    ) -> bool {
        if self.is_protected() {
            return false;
        }
        self.clear();
        for source in [SettingSource::User, SettingSource::Instrument] {
            if source_on_file(reader, source, self.group()) {
                self.load_legacy_from(reader, source, diagnostics);
                return true;
            }
        }
        false
    }

    /// Loads from one specific source
    pub fn load_legacy_from(
        &mut self,
        reader: &dyn SettingsReader,
        source: SettingSource,
        diagnostics: &mut LoadDiagnostics,
    ) {
        self.sync_to_template();
        let group = self.group().to_string();
        let template = self.template();
        let max = template.len() as i32;

        self.set_full(reader.read_boolean(source, &group, IS_FULL, false, false));
        let count = read_entry_count(reader, source, &group, max, true).clamp(0, max);

        for serial in 1..=count as usize {
            let key = entry_key(serial);
            let value = reader.read_integer(source, &group, &key, -max - 1, max, true, 0);
            let (display_index, engaged) = if value >= 0 {
                (value as u32, true)
            } else {
                ((-value - 1) as u32, false)
            };
            match template
                .by_display_index(display_index)
                .and_then(|position| template.get(position))
            {
                Some(element) => self.set_loaded_state(
                    element.kind,
                    element.manual,
                    element.number,
                    engaged,
                    &key,
                    diagnostics,
                ),
                None => diagnostics.push(Diagnostic::InvalidEntry {
                    group: group.clone(),
                    entry: key,
                }),
            }
        }
        debug!(group = %group, entries = count, ?source, "loaded legacy combination");
    }

    /// Writes the combination in the legacy form
    pub fn save_legacy(&self, writer: &mut dyn SettingsWriter) {
        let group = self.group();
        writer.write_boolean(group, IS_FULL, self.is_full());

        let entries: Vec<i32> = self
            .template()
            .elements()
            .iter()
            .zip(self.state())
            .filter_map(|(element, state)| match state {
                TriState::On => Some(element.display_index as i32),
                TriState::Off => Some(-(element.display_index as i32) - 1),
                TriState::Unset => None,
            })
            .collect();

        writer.write_integer(group, NUMBER_OF_STOPS, entries.len() as i32);
        for (serial, value) in entries.iter().enumerate() {
            writer.write_integer(group, &entry_key(serial + 1), *value);
        }
        debug!(group = %group, entries = entries.len(), "saved legacy combination");
    }
}
