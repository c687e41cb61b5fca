//! AI Photo Booth
//!
//! This library provides the core of the photo-booth backend: it submits
//! capture frames to a remote image-generation service, polls the job until it
//! finishes, composites the branding overlay onto the result, and publishes the
//! finished image to S3-compatible storage so guests can fetch it by QR code.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
