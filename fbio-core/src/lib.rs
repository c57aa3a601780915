//! Board-agnostic display refresh engine
//!
//! This crate contains the display logic that does not depend on a
//! specific framebuffer or MCU:
//!
//! - Area algebra (clipping, sizing, bounded dirty-area lists)
//! - Colorspace and rotation transform definitions
//! - Display core (geometry, shown scene, full/partial refresh tracking)
//! - Chunk planning for bounded working buffers
//! - Frame pacing state machine
//! - Configuration types and parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod area;
pub mod colorspace;
pub mod config;
pub mod display_core;
pub mod error;
pub mod pacing;
pub mod pixel;
pub mod refresh;
pub mod scene;
pub mod transform;

pub use area::{Area, AreaList, CapacityError, MAX_REFRESH_AREAS};
pub use colorspace::Colorspace;
pub use display_core::DisplayCore;
pub use error::ConfigError;
pub use pacing::{DeadlineMissed, FramePacer, PacingDecision, PacingState};
pub use refresh::{ChunkPlan, RefreshSession, WORKING_BUFFER_WORDS};
pub use scene::{Scene, SceneHandle, SceneSlots};
pub use transform::{Rotation, Transform};
