//! Data models for activities and importer configuration.

pub mod activity;
pub mod config;
