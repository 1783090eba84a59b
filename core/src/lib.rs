//! Core

extern crate bitflags;
#[macro_use]
extern crate hexf;
#[macro_use]
extern crate log;

// Re-export.
pub mod app;
pub mod common;
pub mod error;
pub mod fragment;
pub mod geometry;
pub mod light;
pub mod material;
pub mod memory;
pub mod object;
pub mod parallel;
pub mod photon;
pub mod raster;
pub mod rng;
pub mod sampling;
pub mod spectrum;
pub mod svd;
