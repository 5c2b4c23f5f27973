//! Integration tests for the combination engine
//!
//! These scenarios drive the whole capture -> save -> drift -> load ->
//! recall cycle the way a console host would, against the in-memory console
//! and settings store.

use anyhow::Result;
use regent_core::domain::{
    CaptureMode, Combination, CombinationTemplate, ConsoleModel, ConsoleRegistry, ElementKind,
    LoadDiagnostics, ManualId, MemorySettings, SetterSession, Severity, TriState,
};

const GREAT: Option<ManualId> = Some(ManualId::new(1));
const SWELL: Option<ManualId> = Some(ManualId::new(2));

const GREAT_STOPS: &[&str] = &["Principal 8", "Octave 4", "Mixture IV", "Trumpet 8"];
const SWELL_STOPS: &[&str] = &["Gedackt 8", "Salicional 8", "Oboe 8"];

fn build_console() -> ConsoleModel {
    let mut console = ConsoleModel::new();
    for name in GREAT_STOPS {
        console.add_element(ElementKind::Stop, GREAT, name);
    }
    for name in SWELL_STOPS {
        console.add_element(ElementKind::Stop, SWELL, name);
    }
    console.add_element(ElementKind::Coupler, GREAT, "Swell to Great");
    console.add_element(ElementKind::Tremulant, None, "Tremulant");
    console
}

/// General template spanning both manuals, everything always governed
fn general_template() -> CombinationTemplate {
    let mut template = CombinationTemplate::new();
    template.add_scope(ElementKind::Stop, GREAT, GREAT_STOPS.len() as u32, true);
    template.add_scope(ElementKind::Stop, SWELL, SWELL_STOPS.len() as u32, true);
    template.add_scope(ElementKind::Coupler, GREAT, 1, true);
    template.add_scope(ElementKind::Tremulant, None, 1, true);
    template
}

fn engaged_stops(console: &ConsoleModel, manual: Option<ManualId>) -> Vec<u32> {
    (1..=console.element_count(ElementKind::Stop, manual))
        .filter(|n| console.is_engaged(ElementKind::Stop, manual, *n))
        .collect()
}

#[test]
fn test_capture_save_recall_via_legacy_form() {
    let mut console = build_console();
    console.set_engaged(ElementKind::Stop, GREAT, 1, true);
    console.set_engaged(ElementKind::Stop, SWELL, 3, true);
    console.set_engaged(ElementKind::Coupler, GREAT, 1, true);

    let template = general_template();
    let mut combination = Combination::new(&template, "General001");
    assert!(combination.fill_with_current(&console, CaptureMode::Regular, false));

    let mut settings = MemorySettings::new();
    combination.save_legacy(&mut settings);
    assert!(Combination::is_on_file(&settings, "General001"));

    // a different console session: nothing engaged anymore
    let mut later_console = build_console();
    let mut restored = Combination::new(&template, "General001");
    let mut diagnostics = LoadDiagnostics::new();
    assert!(restored.load_legacy(&settings, &mut diagnostics));
    assert!(diagnostics.is_clean());

    assert!(restored.push_local(&mut later_console, None, None));
    assert_eq!(engaged_stops(&later_console, GREAT), vec![1]);
    assert_eq!(engaged_stops(&later_console, SWELL), vec![3]);
    assert!(later_console.is_engaged(ElementKind::Coupler, GREAT, 1));
    assert!(!later_console.is_engaged(ElementKind::Tremulant, None, 1));
}

#[test]
fn test_structured_form_survives_renumbering() -> Result<()> {
    let mut console = build_console();
    console.set_engaged(ElementKind::Stop, SWELL, 3, true); // Oboe 8

    let template = general_template();
    let mut combination = Combination::new(&template, "General002");
    combination.fill_with_current(&console, CaptureMode::Regular, false);

    // persist through an actual YAML text, as the host would
    let text = serde_yaml::to_string(&combination.to_tree(&console))?;

    // instrument revision: the swell stop list was reordered
    let mut revised = ConsoleModel::new();
    for name in GREAT_STOPS {
        revised.add_element(ElementKind::Stop, GREAT, name);
    }
    for name in ["Oboe 8", "Gedackt 8", "Salicional 8"] {
        revised.add_element(ElementKind::Stop, SWELL, name);
    }
    revised.add_element(ElementKind::Coupler, GREAT, "Swell to Great");
    revised.add_element(ElementKind::Tremulant, None, "Tremulant");

    let mut restored = Combination::new(&template, "General002");
    let mut diagnostics = LoadDiagnostics::new();
    restored.from_tree(&serde_yaml::from_str(&text)?, &revised, &mut diagnostics);

    // the drift was resolved by name and reported as a warning
    assert!(diagnostics.errors().next().is_none());
    assert_eq!(diagnostics.warnings().count(), 1);
    assert!(diagnostics
        .entries()
        .iter()
        .all(|d| d.severity() == Severity::Warning));

    restored.push_local(&mut revised, None, None);
    assert_eq!(engaged_stops(&revised, SWELL), vec![1]); // Oboe 8 moved to 1
    Ok(())
}

#[test]
fn test_hand_written_tree_loads() -> Result<()> {
    let console = build_console();
    let template = general_template();

    let text = r#"
manuals:
  "01":
    stops:
      "001": Principal 8
      "004": Trumpet 8
  "02":
    stops:
      "002": Salicional 8
tremulants:
  "001": Tremulant
full: true
"#;

    let mut combination = Combination::new(&template, "General003");
    let mut diagnostics = LoadDiagnostics::new();
    combination.from_tree(&serde_yaml::from_str(text)?, &console, &mut diagnostics);

    assert!(diagnostics.is_clean());
    assert!(combination.is_full());
    assert_eq!(combination.state_at(0), TriState::On);
    assert_eq!(combination.state_at(3), TriState::On);
    // full combination: every unmentioned slot is positively off
    assert_eq!(combination.state_at(1), TriState::Off);
    assert_eq!(combination.state_at(4), TriState::Off);
    Ok(())
}

#[test]
fn test_scope_then_scoped_refinement() {
    let mut console = build_console();
    console.set_engaged(ElementKind::Stop, GREAT, 2, true);
    console.set_engaged(ElementKind::Stop, GREAT, 3, true);

    let template = general_template();
    let mut combination = Combination::new(&template, "Crescendo01");

    // first pass decides the membership
    let scope = SetterSession {
        mode: CaptureMode::Scope,
        store_invisible: false,
    };
    combination.push_local(&mut console, Some(&scope), None);
    assert_eq!(combination.state_at(1), TriState::On);
    assert_eq!(combination.state_at(0), TriState::Unset);

    // refine: stop 3 released, stop 2 kept; membership is frozen
    console.set_engaged(ElementKind::Stop, GREAT, 3, false);
    console.set_engaged(ElementKind::Stop, GREAT, 1, true);
    let scoped = SetterSession {
        mode: CaptureMode::Scoped,
        store_invisible: false,
    };
    combination.push_local(&mut console, Some(&scoped), None);

    assert_eq!(combination.state_at(0), TriState::Unset); // still not a member
    assert_eq!(combination.state_at(1), TriState::On);
    assert_eq!(combination.state_at(2), TriState::Off);
}

#[test]
fn test_cumulative_recall_keeps_extra_engaged() {
    let mut console = build_console();
    let template = general_template();

    let mut combination = Combination::new(&template, "Divisional001");
    combination.set_state_at(0, TriState::On);
    combination.set_state_at(1, TriState::Off);
    combination.set_state_at(2, TriState::Off);

    // the organist drew stop 2 by hand since the combination was set
    console.set_engaged(ElementKind::Stop, GREAT, 2, true);

    let excluded = combination.extra_engaged_elements(&console);
    combination.push_local(&mut console, None, Some(&excluded));

    assert_eq!(engaged_stops(&console, GREAT), vec![1, 2]);

    // plain recall disengages it
    combination.push_local(&mut console, None, None);
    assert_eq!(engaged_stops(&console, GREAT), vec![1]);
}

#[test]
fn test_protected_preset_is_frozen() {
    let console = build_console();
    let template = general_template();

    let mut factory = Combination::new(&template, "Factory001");
    factory.set_state_at(0, TriState::On);
    factory.set_protected(true);

    let mut settings = MemorySettings::new();
    let mut donor = Combination::new(&template, "Factory001");
    donor.set_state_at(1, TriState::On);
    donor.save_legacy(&mut settings);

    let mut diagnostics = LoadDiagnostics::new();
    assert!(!factory.load_legacy(&settings, &mut diagnostics));
    factory.from_tree(&donor.to_tree(&console), &console, &mut diagnostics);

    assert_eq!(factory.state_at(0), TriState::On);
    assert_eq!(factory.state_at(1), TriState::Unset);
}
