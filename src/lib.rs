//! iiif-presenter - IIIF Presentation 3 manifests for images hosted anywhere
//!
//! This library crate exposes the engine and server for integration testing.

pub mod cache;
pub mod clock;
pub mod config;
pub mod engine;
pub mod entities;
pub mod handlers;
pub mod http;
pub mod image_service;
pub mod media_probe;
pub mod memo;
pub mod queue;
pub mod server;
