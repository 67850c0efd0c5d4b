//! stand-capture library crate.
//!
//! Samples frames from a camera a few times per second, uploads them to a
//! remote object-detection service, and lays the returned boxes over the
//! displayed video.

pub mod camera;
pub mod capture;
pub mod config;
pub mod detect;
pub mod overlay;
