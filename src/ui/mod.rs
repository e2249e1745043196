//! egui rendering. Widgets read from and write to [`crate::state::AppState`];
//! no data processing happens here.

pub mod panels;
pub mod plot;
