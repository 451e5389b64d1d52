pub mod catalog;
pub mod preview;
pub mod scenarios;

pub use catalog::render_catalog;
pub use preview::{preview, render_preview, PreviewRequest};
pub use scenarios::{create, delete, list, render_scenario, render_table, show, update};
