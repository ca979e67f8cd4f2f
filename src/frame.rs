//! The 64x32 monochrome framebuffer.
//!
//! Pixels are stored row-major, one bit per pixel, most significant bit
//! leftmost. The only mutations the machine ever applies are clearing the
//! whole frame and XOR-ing single pixels during sprite draws.

use bitvec::prelude::*;

#[cfg(feature = "embedded-graphics")]
use embedded_graphics::{image::ImageRaw, pixelcolor::BinaryColor};

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub(crate) const MEM_LENGTH: usize = WIDTH * HEIGHT / 8;

/// An opaque struct holding one frame of the display
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Frame([u8; MEM_LENGTH]);

/// A shared view over a `Frame`
///
/// Has different accessors for the content of frames, which can be used
/// independently to fulfill the needs. Each pixel is represented either by
/// a corresponding bit being set, or by a `true` value.
///
/// #Note:
/// Can return an ImageRaw instance with the `embedded-graphics` feature on.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FrameView<'a>(&'a [u8; MEM_LENGTH]);

impl<'a> FrameView<'a> {
    /// View the raw memory of a frame
    pub fn as_raw(&self) -> &[u8] {
        self.0
    }

    /// Create an immutable copy of a frame
    pub fn copy_frame(self) -> Frame {
        Frame(*self.0)
    }

    /// Access frame's bits by indexes
    pub fn get_bit(&self, x: usize, y: usize) -> Option<&bool> {
        self.iter_rows_as_bitslices()
            .nth(y)
            .map(|row| row.get(x))
            .flatten()
    }

    /// Get iterator over rows in a form of `BitSlice`s
    pub fn iter_rows_as_bitslices(&self) -> impl Iterator<Item = &'a BitSlice<Msb0, u8>> {
        self.0.chunks(WIDTH / 8).map(|row| row.view_bits::<_>())
    }

    /// Get an `ImageRaw` structure from frame's data
    #[cfg(feature = "embedded-graphics")]
    pub fn as_raw_image(&self) -> ImageRaw<'_, BinaryColor> {
        ImageRaw::new(self.as_raw(), WIDTH as u32, HEIGHT as u32)
    }
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self([0; MEM_LENGTH])
    }

    /// Get view over frame
    pub fn view(&self) -> FrameView<'_> {
        FrameView(&self.0)
    }

    pub(crate) fn clear(&mut self) {
        self.0 = [0; MEM_LENGTH];
    }

    pub(crate) fn xor_bit(&mut self, x: usize, y: usize, val: bool) -> Result<(), &'static str> {
        self.iter_rows_as_bitslices_mut()
            .nth(y)
            .map(|row| row.get_mut(x).map(|mut bit| *bit ^= val))
            .flatten()
            .ok_or("Pixel index out of bounds")
    }

    fn iter_rows_as_bitslices_mut(&mut self) -> impl Iterator<Item = &mut BitSlice<Msb0, u8>> {
        self.0
            .chunks_mut(WIDTH / 8)
            .map(|row| row.view_bits_mut::<_>())
    }
}

#[cfg(test)]
impl Frame {
    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
