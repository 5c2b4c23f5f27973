//! Regent core: the combination action engine of a virtual organ console.
//!
//! A combination is a named snapshot of the on/off state of the console's
//! controllable elements (stops, couplers, tremulants, switches, divisional
//! couplers) that an operator captures once and recalls with one piston
//! press. This crate owns the template/state data model, the two
//! persistence codecs (the legacy flat key-value form and the structured
//! tree form with its drift reconciler) and the apply/capture engine. The
//! console itself, file I/O and all presentation live outside.

pub mod domain;
