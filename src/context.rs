//! Context for accessing functionalities of the platform that the machine
//! is emulated on.
//!
//! The core never touches a screen, a speaker, a keyboard or an entropy
//! source directly. Everything it needs from the outside world goes
//! through this trait, which keeps the engine deterministic under test
//! and portable down to bare-metal targets.

use crate::frame::FrameView;

/// Trait aggregating platform functionalities
pub trait Context {
    /// Present the current frame
    ///
    /// Called by `tick_chip` after any step that mutated the framebuffer
    fn on_frame(&mut self, frame: FrameView<'_>);
    /// Turn sound on
    ///
    /// Called by `tick_timers` while the sound timer is running down
    fn sound_on(&mut self);
    /// Turn sound off
    ///
    /// Called by `tick_timers` when the sound timer reaches zero
    fn sound_off(&mut self);
    /// Get state of each key on the 4x4 keyboard
    ///
    /// Called whenever the executing program inspects the keys
    fn get_keys(&mut self) -> &[bool; 16];
    /// Generate random 8-bit number
    ///
    /// Called whenever requested by the executing program
    fn gen_random(&mut self) -> u8;
}
