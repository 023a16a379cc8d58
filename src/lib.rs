//! Island terrain generation library
//!
//! Falloff masks, heightmap synthesis and lake detection, plus the settings
//! and export helpers the binaries use.

pub mod curve;
pub mod error;
pub mod export;
pub mod falloff;
pub mod heightmap;
pub mod island;
pub mod noise_map;
pub mod settings;
pub mod tilemap;
pub mod water_bodies;
