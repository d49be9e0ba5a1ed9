/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - The analysis session: current image, result slots, loading flags (session.rs)
/// - Capture modes, the auto-capture countdown and review sub-state (mode.rs)

pub mod data;
pub mod mode;
pub mod session;
