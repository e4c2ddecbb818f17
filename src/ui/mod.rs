//! Terminal UI rendering using ratatui.
//!
//! This module contains all the view-specific rendering logic for the TUI.
//! Each view is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`risk_map`]: Districts for the selected date, colored by risk tier
//! - [`tables`]: Server-paginated rain, risk area and province/district tables
//! - [`statistics`]: Uploaded statistics files and rain datasets
//! - [`detail`]: Modal overlay with the district tooltip or a statistics preview
//! - [`prompt`]: Login and upload forms
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! The main loop in `main.rs` calls into these modules based on the current view:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (risk_map/tables/statistics)         │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - detail::render_overlay
//!    - prompt::render
//!    - common::render_help
//! ```

pub mod common;
pub mod detail;
pub mod prompt;
pub mod risk_map;
pub mod statistics;
pub mod tables;
pub mod theme;

pub use theme::Theme;
