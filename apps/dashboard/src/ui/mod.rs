pub mod render;

pub use render::{DashboardView, ViewUpdate};
