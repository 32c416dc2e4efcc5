//! Controller layer: user commands, UI events, and command orchestration.

pub mod commands;
pub mod events;
pub mod orchestration;
