// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # landslide-watch
//!
//! A terminal dashboard for curating landslide-risk data served by a FastAPI
//! backend: a risk map of districts for a chosen date, paginated rain, risk
//! area and province/district tables, file uploads and ingestion statistics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(processing)   │(rendering)   │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │ Request / Reply                                     │
//! │       ▼                                                     │
//! │  ┌─────────┐      ┌─────────┐                               │
//! │  │ source  │─────▶│   api   │──▶ HTTP backend               │
//! │  │ (tickets)│      │ (client)│                               │
//! │  └─────────┘      └─────────┘                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, session guard, view navigation and user interaction
//! - **[`source`]**: The [`DataSource`] trait; [`HttpSource`] runs requests on a
//!   background worker, [`ChannelSource`] answers them from an in-memory channel
//! - **[`api`]**: Typed client for the backend endpoints and its error type
//! - **[`data`]**: Risk classification, listing/pagination state and formatting
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**, **[`logging`]**, **[`export`]**: settings, tracing setup and JSON export
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Interactive dashboard against a local backend
//! landslide-watch --api-base http://localhost:8000
//!
//! # Upload a risk area table and exit
//! LANDSLIDE_USERNAME=curator LANDSLIDE_PASSWORD=... landslide-watch --upload-dbf areas.dbf
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use landslide_watch::{App, AppOptions, ChannelSource};
//!
//! let (mut backend, source) = ChannelSource::create("embedded");
//! let mut app = App::new(Box::new(source), AppOptions::default());
//!
//! // The first sync asks for the session
//! app.sync();
//! assert_eq!(backend.drain().len(), 1);
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod export;
pub mod logging;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError};
pub use app::{App, AppOptions, View};
pub use config::Settings;
pub use data::{classify, Classification, ColorTier, Observation};
pub use source::{ChannelSource, DataSource, HttpSource, Payload, Reply, Request};
