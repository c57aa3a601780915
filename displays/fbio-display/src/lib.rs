//! Framebuffer display driver for fbio
//!
//! This crate provides:
//! - [`FramebufferDisplay`], which streams a scene into a [`fbio_hal::Framebuffer`]
//!   in bounded chunks and presents it, paced either by its own background tick
//!   (auto refresh) or by explicit `refresh` calls
//! - [`Terminal`], the hook for a text overlay that follows the display size
//!
//! # Architecture
//!
//! The display owns the framebuffer device, a clock and the terminal overlay.
//! Scene roots stay with the caller in a [`fbio_core::SceneSlots`] arena that is
//! passed into every call needing the scene; the display only keeps a handle.
//! Cooperative work (LEDs, watchdogs, input polling) runs through a
//! [`fbio_hal::Background`] hook between chunks and while waiting for a frame
//! boundary.

#![no_std]

#[macro_use]
mod log;

pub mod display;
pub mod terminal;

pub use display::{DisplayError, FramebufferDisplay, RefreshStats};
pub use terminal::{NoTerminal, Terminal};
