//! Flat key-value settings contract used by the legacy codec
//!
//! Real file readers/writers live outside this crate; the engine only
//! consumes this contract. `MemorySettings` is a two-source in-memory
//! implementation, useful to hosts that buffer settings before writing
//! them out and to tests.
//!
//! Readers are total: a missing or malformed value yields the caller's
//! default (with a `tracing` report when the value was required or
//! malformed), never an error. This keeps entry-by-entry loads best-effort.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;

/// Which settings store a read targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingSource {
    /// Values embedded in the instrument definition
    Instrument,
    /// The user's override store
    User,
}

pub trait SettingsReader {
    /// Reads an integer under `group`/`key`. Values outside `min..=max`
    /// and missing required values are reported and replaced by `default`.
    #[allow(clippy::too_many_arguments)]
    fn read_integer(
        &self,
        source: SettingSource,
        group: &str,
        key: &str,
        min: i32,
        max: i32,
        required: bool,
        default: i32,
    ) -> i32;

    /// Reads a boolean under `group`/`key`
    fn read_boolean(
        &self,
        source: SettingSource,
        group: &str,
        key: &str,
        required: bool,
        default: bool,
    ) -> bool;
}

pub trait SettingsWriter {
    fn write_integer(&mut self, group: &str, key: &str, value: i32);
    fn write_boolean(&mut self, group: &str, key: &str, value: bool);
}

/// In-memory settings store with an instrument and a user source.
///
/// Booleans are stored as `Y`/`N`, integers as decimal strings, matching
/// the flat files this contract was lifted from. Writes always target the
/// user source; the instrument source is seeded by the host.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    instrument: BTreeMap<(String, String), String>,
    user: BTreeMap<(String, String), String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value into one of the sources
    pub fn seed(&mut self, source: SettingSource, group: &str, key: &str, value: &str) {
        self.source_mut(source)
            .insert((group.to_string(), key.to_string()), value.to_string());
    }

    /// Raw value under `group`/`key`, if present
    pub fn entry(&self, source: SettingSource, group: &str, key: &str) -> Option<&str> {
        self.source(source)
            .get(&(group.to_string(), key.to_string()))
            .map(String::as_str)
    }

    fn source(&self, source: SettingSource) -> &BTreeMap<(String, String), String> {
        match source {
            SettingSource::Instrument => &self.instrument,
            SettingSource::User => &self.user,
        }
    }

    fn source_mut(&mut self, source: SettingSource) -> &mut BTreeMap<(String, String), String> {
        match source {
            SettingSource::Instrument => &mut self.instrument,
            SettingSource::User => &mut self.user,
        }
    }
}

impl SettingsReader for MemorySettings {
    fn read_integer(
        &self,
        source: SettingSource,
        group: &str,
        key: &str,
        min: i32,
        max: i32,
        required: bool,
        default: i32,
    ) -> i32 {
        match self.entry(source, group, key) {
            Some(raw) => match raw.trim().parse::<i32>() {
                Ok(value) if (min..=max).contains(&value) => value,
                Ok(value) => {
                    error!("setting {group}/{key} = {value} is outside {min}..={max}");
                    default
                }
                Err(_) => {
                    error!("setting {group}/{key} = {raw:?} is not an integer");
                    default
                }
            },
            None => {
                if required {
                    error!("missing required setting {group}/{key}");
                }
                default
            }
        }
    }

    fn read_boolean(
        &self,
        source: SettingSource,
        group: &str,
        key: &str,
        required: bool,
        default: bool,
    ) -> bool {
        match self.entry(source, group, key) {
            Some(raw) => match raw.trim() {
                "Y" | "y" => true,
                "N" | "n" => false,
                other => {
                    error!("setting {group}/{key} = {other:?} is not a boolean");
                    default
                }
            },
            None => {
                if required {
                    error!("missing required setting {group}/{key}");
                }
                default
            }
        }
    }
}

impl SettingsWriter for MemorySettings {
    fn write_integer(&mut self, group: &str, key: &str, value: i32) {
        self.seed(SettingSource::User, group, key, &value.to_string());
    }

    fn write_boolean(&mut self, group: &str, key: &str, value: bool) {
        self.seed(SettingSource::User, group, key, if value { "Y" } else { "N" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_fall_back() {
        let settings = MemorySettings::new();
        assert_eq!(
            settings.read_integer(SettingSource::User, "G", "K", 0, 10, false, -1),
            -1
        );
        assert!(settings.read_boolean(SettingSource::User, "G", "K", false, true));
    }

    #[test]
    fn test_out_of_range_falls_back() {
        let mut settings = MemorySettings::new();
        settings.seed(SettingSource::Instrument, "G", "K", "42");
        assert_eq!(
            settings.read_integer(SettingSource::Instrument, "G", "K", 0, 10, true, 0),
            0
        );
        assert_eq!(
            settings.read_integer(SettingSource::Instrument, "G", "K", 0, 99, true, 0),
            42
        );
    }

    #[test]
    fn test_writes_target_the_user_source() {
        let mut settings = MemorySettings::new();
        settings.write_integer("G", "NumberOfStops", 3);
        settings.write_boolean("G", "IsFull", true);

        assert_eq!(settings.entry(SettingSource::User, "G", "NumberOfStops"), Some("3"));
        assert_eq!(settings.entry(SettingSource::User, "G", "IsFull"), Some("Y"));
        assert_eq!(settings.entry(SettingSource::Instrument, "G", "IsFull"), None);
    }

    #[test]
    fn test_boolean_letters() {
        let mut settings = MemorySettings::new();
        settings.seed(SettingSource::User, "G", "A", "N");
        settings.seed(SettingSource::User, "G", "B", "y");
        assert!(!settings.read_boolean(SettingSource::User, "G", "A", true, true));
        assert!(settings.read_boolean(SettingSource::User, "G", "B", true, false));
    }
}
