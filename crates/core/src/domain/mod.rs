//! Domain entities and business rules

pub mod combination;
pub mod console;
pub mod diagnostics;
pub mod legacy;
pub mod settings;
pub mod structured;
pub mod template;

// Re-export specific items to avoid ambiguous glob imports
pub use combination::{
    CaptureMode, Combination, CombinationError, ElementSet, SetterSession, TriState,
};
pub use console::{ConsoleModel, ConsoleRegistry, ElementKind, ManualId};
pub use diagnostics::{Diagnostic, LoadDiagnostics, Severity};
pub use settings::{MemorySettings, SettingSource, SettingsReader, SettingsWriter};
pub use template::{CombinationTemplate, ElementDefinition};
