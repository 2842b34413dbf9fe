//! Library crate for footprint-guard exposing reusable modules.
pub mod api;
pub mod controller;
pub mod render;
pub mod server;
pub mod timeline;
pub mod types;
