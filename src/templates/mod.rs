//! HTML templates and styling for the web interface.
//!
//! ## Module Structure
//!
//! - `styles` - CSS constants
//! - `components` - navigation bar, sidebar and the page shell
//! - `dashboard` - document cards, filters and statistics
//! - `editor` - contenteditable editor with toolbar and auto-save
//! - `shared` - read-only shared view
//! - `import`, `export`, `settings` - the remaining views

mod components;
mod dashboard;
mod editor;
mod export;
mod import;
mod settings;
mod shared;
mod styles;

pub use components::{base_html, json_for_script, nav_bar, sidebar, Layout};
pub use dashboard::{render_dashboard, time_ago};
pub use editor::render_editor;
pub use export::render_export;
pub use import::render_import;
pub use settings::render_settings;
pub use shared::render_shared;
pub use styles::STYLE;
