//! A CHIP-8 virtual machine core.
//!
//! The machine state lives in [`Chip8`], which is stepped one instruction
//! at a time with [`Chip8::tick_chip`] and has its two countdown timers
//! advanced with [`Chip8::tick_timers`] at a nominal 60 Hz. All platform
//! facilities (display, sound, keyboard, randomness) are reached through
//! the [`Context`] trait, so the core itself stays `no_std` and free of
//! any I/O.
//!
//! With the `std` feature enabled, [`runner::Runner`] provides a paced
//! free-running loop with cooperative cancellation.
#![cfg_attr(not(feature = "std"), no_std)]

pub mod builder;
pub mod chip8;
pub mod context;
pub mod error;
pub mod frame;
pub mod opcode;
#[cfg(feature = "std")]
pub mod runner;
pub mod timer;

#[cfg(feature = "embedded-graphics")]
pub use embedded_graphics;
pub use nb;

pub use builder::Builder;
pub use chip8::Chip8;
pub use context::Context;
pub use error::Error;
pub use frame::{Frame, FrameView, HEIGHT, WIDTH};
pub use opcode::OpCode;
