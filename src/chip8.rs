//! The machine aggregate and its fetch-decode-execute engine.
//!
//! One `Chip8` owns the whole machine state: 4096 bytes of unified
//! memory, the sixteen `V` registers, the address register `I`, the
//! program counter, a 16-level call stack, the framebuffer and both
//! countdown timers. Hosts drive it with `tick_chip` (one instruction)
//! and `tick_timers` (one 60 Hz timer tick); the two must not be invoked
//! concurrently without external synchronization.
//!
//! Each step is atomic: it either applies its full documented effect or
//! fails with an [`Error`] before any mutation counts, and the faulting
//! program counter is preserved for the host to report.

use core::convert::TryFrom;

use heapless::{consts::U16, Vec};

use crate::context::Context;
use crate::error::Error;
use crate::frame::{Frame, FrameView, HEIGHT, WIDTH};
use crate::opcode::OpCode;
use crate::timer::{Timer, TimerState};

/// Address programs are loaded at and execution starts from
pub const START_ADDR: u16 = 0x200;

/// Height in bytes of one font glyph
pub const GLYPH_HEIGHT: u16 = 5;

/// The built-in hexadecimal font, one 8x5 glyph per digit 0x0..=0xF,
/// installed at address 0x000
pub const FONT: [u8; 16 * GLYPH_HEIGHT as usize] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

pub struct Chip8<C: Context + Sized> {
    ctx: C,
    v: [u8; 16],
    i: u16,
    pc: u16,
    stack: Vec<u16, U16>,
    memory: [u8; 4096],
    frame: Frame,
    delay_timer: Timer,
    sound_timer: Timer,
    redraw: bool,
}

impl<C: Context + Sized> Chip8<C> {
    /// Create a machine with zeroed state and the font installed at 0x000
    pub fn new(ctx: C) -> Self {
        let mut memory = [0; 4096];
        memory[..FONT.len()].copy_from_slice(&FONT);
        Self {
            ctx,
            v: [0; 16],
            i: 0,
            pc: START_ADDR,
            stack: Vec::new(),
            memory,
            frame: Frame::new(),
            delay_timer: Timer::new(),
            sound_timer: Timer::new(),
            redraw: false,
        }
    }

    /// Create a machine with `prog` already loaded at the start address
    pub fn load(ctx: C, prog: &[u8]) -> Self {
        let mut chip = Self::new(ctx);
        chip.load_program(prog);
        chip
    }

    /// Load program from a slice of bytes to memory from 0x200 (_start address)
    pub fn load_program(&mut self, prog: &[u8]) {
        let space = self.memory.len() - START_ADDR as usize;
        if prog.len() > space {
            log::warn!(
                "program of {} bytes truncated to {} bytes of memory",
                prog.len(),
                space,
            );
        }
        self.memory[START_ADDR as usize..]
            .iter_mut()
            .zip(prog)
            .for_each(|(mem, &prog)| *mem = prog);
        log::debug!("loaded {} byte program", prog.len().min(space));
    }

    /// Write a slice of bytes at an arbitrary address, e.g. a custom font
    pub fn load_bytes(&mut self, addr: u16, bytes: &[u8]) -> Result<(), Error> {
        let start = addr as usize;
        let end = start + bytes.len();
        if end > self.memory.len() {
            return Err(Error::AddressOutOfRange {
                addr,
                pc: self.pc,
            });
        }
        self.memory[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Access the platform context
    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// View the current framebuffer contents
    pub fn frame(&self) -> FrameView<'_> {
        self.frame.view()
    }

    /// Whether the sound timer is currently non-zero
    pub fn is_sound_active(&self) -> bool {
        self.sound_timer.load() > 0
    }

    /// Perform one fetch-decode-execute step
    ///
    /// Returns `nb::Error::WouldBlock` while a key-wait instruction is
    /// pending, so the host can service input and re-poll.
    pub fn tick_chip(&mut self) -> nb::Result<(), Error> {
        let word = self.fetch().map_err(nb::Error::Other)?;
        let opcode = OpCode::try_from(word).map_err(|_| {
            nb::Error::Other(Error::UnknownInstruction {
                opcode: word,
                pc: self.pc,
            })
        })?;
        log::trace!("executing {:?} at {:#05X}", opcode, self.pc);
        self.execute(opcode)?;
        if self.redraw {
            self.redraw = false;
            self.ctx.on_frame(self.frame.view());
        }
        Ok(())
    }

    /// Advance both countdown timers by one 60 Hz tick
    pub fn tick_timers(&mut self) {
        self.delay_timer.decrement();
        match self.sound_timer.decrement() {
            TimerState::On => self.ctx.sound_on(),
            TimerState::Finished => self.ctx.sound_off(),
            TimerState::Off => {}
        }
    }

    /// Combine the two bytes at `pc` big-endian into an instruction word
    fn fetch(&self) -> Result<u16, Error> {
        let pc = self.pc as usize;
        if pc + 1 >= self.memory.len() {
            return Err(Error::AddressOutOfRange {
                addr: self.pc,
                pc: self.pc,
            });
        }
        Ok(u16::from(self.memory[pc]) << 8 | u16::from(self.memory[pc + 1]))
    }

    fn pc_increment(&mut self) -> Result<(), Error> {
        if self.pc < 0x0FFEu16 {
            self.pc += 2;
            Ok(())
        } else {
            Err(Error::AddressOutOfRange {
                addr: self.pc + 2,
                pc: self.pc,
            })
        }
    }
}

// OpCodes impls
impl<C: Context + Sized> Chip8<C> {
    #[rustfmt::skip]
    fn execute(&mut self, opcode: OpCode) -> nb::Result<(), Error> {
        match opcode {
            OpCode::_1NNN { nnn }     => return self.jump_to(nnn).map_err(nb::Error::Other),
            OpCode::_2NNN { nnn }     => return self.exec_subroutine_at(nnn).map_err(nb::Error::Other),
            OpCode::_BNNN { nnn }     => return self.jump_to_nnn_add_v0(nnn).map_err(nb::Error::Other),
            OpCode::_FX0A { x }       => return self.assign_vx_wait_for_key(x),
            OpCode::_00E0             => self.clear_screen(),
            OpCode::_00EE             => self.subroutine_return(),
            OpCode::_3XNN { x, nn }   => self.skip_if_vx_eq_nn(x, nn),
            OpCode::_4XNN { x, nn }   => self.skip_if_vx_ne_nn(x, nn),
            OpCode::_5XY0 { x, y }    => self.skip_if_vx_eq_vy(x, y),
            OpCode::_6XNN { x, nn }   => self.assign_vx_nn(x, nn),
            OpCode::_7XNN { x, nn }   => self.assign_add_vx_nn(x, nn),
            OpCode::_8XY0 { x, y }    => self.assign_vx_vy(x, y),
            OpCode::_8XY1 { x, y }    => self.assign_or_vx_vy(x, y),
            OpCode::_8XY2 { x, y }    => self.assign_and_vx_vy(x, y),
            OpCode::_8XY3 { x, y }    => self.assign_xor_vx_vy(x, y),
            OpCode::_8XY4 { x, y }    => self.assign_add_vx_vy(x, y),
            OpCode::_8XY5 { x, y }    => self.assign_sub_vx_vy(x, y),
            OpCode::_8XY6 { x, .. }   => self.assign_vx_shifted_r(x),
            OpCode::_8XY7 { x, y }    => self.assign_vx_vy_sub_vx(x, y),
            OpCode::_8XYE { x, .. }   => self.assign_vx_shifted_l(x),
            OpCode::_9XY0 { x, y }    => self.skip_if_vx_ne_vy(x, y),
            OpCode::_ANNN { nnn }     => self.assign_i_nnn(nnn),
            OpCode::_CXNN { x, nn }   => self.assign_vx_random_and_nn(x, nn),
            OpCode::_DXYN { x, y, n } => self.draw_n_at_vx_vy(x, y, n),
            OpCode::_EX9E { x }       => self.skip_if_vx_in_keys(x),
            OpCode::_EXA1 { x }       => self.skip_if_vx_not_in_keys(x),
            OpCode::_FX07 { x }       => self.assign_vx_delay_t(x),
            OpCode::_FX15 { x }       => self.assign_delay_t_vx(x),
            OpCode::_FX18 { x }       => self.assign_sound_t_vx(x),
            OpCode::_FX1E { x }       => self.assign_add_i_vx(x),
            OpCode::_FX29 { x }       => self.assign_i_addr_of_sprite_vx(x),
            OpCode::_FX33 { x }       => self.assign_mem_at_i_bcd_of_vx(x),
            OpCode::_FX55 { x }       => self.assign_mem_at_i_v0_to_vx(x),
            OpCode::_FX65 { x }       => self.assign_v0_to_vx_mem_at_i(x),
        }
        .and_then(|_| self.pc_increment())
        .map_err(nb::Error::Other)
    }

    /// Clear the screen
    /// 00E0,
    fn clear_screen(&mut self) -> Result<(), Error> {
        self.frame.clear();
        self.redraw = true;
        Ok(())
    }

    /// Return from a subroutine
    /// 00EE,
    fn subroutine_return(&mut self) -> Result<(), Error> {
        self.stack
            .pop()
            .ok_or(Error::StackUnderflow { pc: self.pc })
            .map(|addr| self.pc = addr)
    }

    /// Jump to address NNN
    /// 1NNN { nnn: u16 },
    fn jump_to(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = nnn;
        Ok(())
    }

    /// Execute subroutine starting at address NNN
    /// 2NNN { nnn: u16 },
    fn exec_subroutine_at(&mut self, nnn: u16) -> Result<(), Error> {
        self.stack
            .push(self.pc)
            .or(Err(Error::StackOverflow { pc: self.pc }))
            .map(|_| self.pc = nnn)
    }

    /// Skip the following instruction if the value of register VX equals NN
    /// 3XNN { x: u8, nn: u8 },
    fn skip_if_vx_eq_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] == nn {
            self.pc_increment()
        } else {
            Ok(())
        }
    }

    /// Skip the following instruction if the value of register VX is not equal to NN
    /// 4XNN { x: u8, nn: u8 },
    fn skip_if_vx_ne_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] != nn {
            self.pc_increment()
        } else {
            Ok(())
        }
    }

    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    /// 5XY0 { x: u8, y: u8 },
    fn skip_if_vx_eq_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] == self.v[y as usize] {
            self.pc_increment()
        } else {
            Ok(())
        }
    }

    /// Store number NN in register VX
    /// 6XNN { x: u8, nn: u8 },
    fn assign_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = nn;
        Ok(())
    }

    /// Add the value NN to register VX, wrapping, VF untouched
    /// 7XNN { x: u8, nn: u8 },
    fn assign_add_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
        Ok(())
    }

    /// Store the value of register VY in register VX
    /// 8XY0 { x: u8, y: u8 },
    fn assign_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX OR VY
    /// 8XY1 { x: u8, y: u8 },
    fn assign_or_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] |= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX AND VY
    /// 8XY2 { x: u8, y: u8 },
    fn assign_and_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] &= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX XOR VY
    /// 8XY3 { x: u8, y: u8 },
    fn assign_xor_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] ^= self.v[y as usize];
        Ok(())
    }

    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    /// 8XY4 { x: u8, y: u8 },
    fn assign_add_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let (value, overflow) = self.v[x as usize].overflowing_add(self.v[y as usize]);
        self.v[x as usize] = value;
        self.v[15] = if overflow { 0x01u8 } else { 0x00u8 };
        Ok(())
    }

    /// Subtract the value of register VY from register VX, Set VF to 01 if VX is strictly greater than VY, Set VF to 00 otherwise
    /// 8XY5 { x: u8, y: u8 },
    fn assign_sub_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let flag = if self.v[x as usize] > self.v[y as usize] {
            0x01u8
        } else {
            0x00u8
        };
        self.v[x as usize] = self.v[x as usize].wrapping_sub(self.v[y as usize]);
        self.v[15] = flag;
        Ok(())
    }

    /// Shift VX right one bit, Set register VF to the least significant bit prior to the shift
    /// 8XY6 { x: u8, y: u8 },
    fn assign_vx_shifted_r(&mut self, x: u8) -> Result<(), Error> {
        let lsb = self.v[x as usize] & 1u8;
        self.v[x as usize] = self.v[x as usize].wrapping_shr(1);
        self.v[15] = lsb;
        Ok(())
    }

    /// Set register VX to the value of VY minus VX, Set VF to 01 if VY is strictly greater than VX, Set VF to 00 otherwise
    /// 8XY7 { x: u8, y: u8 },
    fn assign_vx_vy_sub_vx(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let flag = if self.v[y as usize] > self.v[x as usize] {
            0x01u8
        } else {
            0x00u8
        };
        self.v[x as usize] = self.v[y as usize].wrapping_sub(self.v[x as usize]);
        self.v[15] = flag;
        Ok(())
    }

    /// Shift VX left one bit, Set register VF to the most significant bit prior to the shift
    /// 8XYE { x: u8, y: u8 },
    fn assign_vx_shifted_l(&mut self, x: u8) -> Result<(), Error> {
        let msb = self.v[x as usize] >> 7;
        self.v[x as usize] = self.v[x as usize].wrapping_shl(1);
        self.v[15] = msb;
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    /// 9XY0 { x: u8, y: u8 },
    fn skip_if_vx_ne_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] != self.v[y as usize] {
            self.pc_increment()
        } else {
            Ok(())
        }
    }

    /// Store memory address NNN in register I
    /// ANNN { nnn: u16 },
    fn assign_i_nnn(&mut self, nnn: u16) -> Result<(), Error> {
        self.i = nnn;
        Ok(())
    }

    /// Jump to address NNN + V0
    /// BNNN { nnn: u16 },
    fn jump_to_nnn_add_v0(&mut self, nnn: u16) -> Result<(), Error> {
        let addr = nnn + self.v[0] as u16;
        if addr <= 0x0FFFu16 {
            self.pc = addr;
            Ok(())
        } else {
            Err(Error::AddressOutOfRange { addr, pc: self.pc })
        }
    }

    /// Set VX to a random number with a mask of NN
    /// CXNN { x: u8, nn: u8 },
    fn assign_vx_random_and_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.ctx.gen_random() & nn;
        Ok(())
    }

    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    /// DXYN { x: u8, y: u8, n: u8 },
    fn draw_n_at_vx_vy(&mut self, x: u8, y: u8, n: u8) -> Result<(), Error> {
        let start = self.i as usize;
        let end = start + n as usize;
        if end > self.memory.len() {
            return Err(Error::AddressOutOfRange {
                addr: self.i.wrapping_add(n as u16),
                pc: self.pc,
            });
        }
        let origin_x = self.v[x as usize] as usize % WIDTH;
        let origin_y = self.v[y as usize] as usize % HEIGHT;
        self.v[15] = 0;
        for row in 0..n as usize {
            let byte = self.memory[start + row];
            let py = (origin_y + row) % HEIGHT;
            for col in 0..8 {
                let px = (origin_x + col) % WIDTH;
                let set = byte >> (7 - col) & 1 == 1;
                if set && self.frame.view().get_bit(px, py) == Some(&true) {
                    self.v[15] = 1;
                }
                self.frame
                    .xor_bit(px, py, set)
                    .map_err(|_| Error::AddressOutOfRange {
                        addr: self.i + row as u16,
                        pc: self.pc,
                    })?;
            }
        }
        self.redraw = true;
        Ok(())
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    /// EX9E { x: u8 },
    fn skip_if_vx_in_keys(&mut self, x: u8) -> Result<(), Error> {
        let keys = *self.ctx.get_keys();
        if keys.get(self.v[x as usize] as usize) == Some(&true) {
            self.pc_increment()
        } else {
            Ok(())
        }
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    /// EXA1 { x: u8 },
    fn skip_if_vx_not_in_keys(&mut self, x: u8) -> Result<(), Error> {
        let keys = *self.ctx.get_keys();
        if keys.get(self.v[x as usize] as usize) != Some(&true) {
            self.pc_increment()
        } else {
            Ok(())
        }
    }

    /// Store the current value of the delay timer in register VX
    /// FX07 { x: u8 },
    fn assign_vx_delay_t(&mut self, x: u8) -> Result<(), Error> {
        self.v[x as usize] = self.delay_timer.load();
        Ok(())
    }

    /// Wait for a keypress and store the result in register VX
    /// FX0A { x: u8 },
    fn assign_vx_wait_for_key(&mut self, x: u8) -> nb::Result<(), Error> {
        let keys = *self.ctx.get_keys();
        match keys.iter().position(|&key| key) {
            Some(key) => {
                self.v[x as usize] = key as u8;
                self.pc_increment().map_err(nb::Error::Other)
            }
            None => Err(nb::Error::WouldBlock),
        }
    }

    /// Set the delay timer to the value of register VX
    /// FX15 { x: u8 },
    fn assign_delay_t_vx(&mut self, x: u8) -> Result<(), Error> {
        self.delay_timer.store(self.v[x as usize]);
        Ok(())
    }

    /// Set the sound timer to the value of register VX
    /// FX18 { x: u8 },
    fn assign_sound_t_vx(&mut self, x: u8) -> Result<(), Error> {
        self.sound_timer.store(self.v[x as usize]);
        Ok(())
    }

    /// Add the value stored in register VX to register I, wrapping, VF untouched
    /// FX1E { x: u8 },
    fn assign_add_i_vx(&mut self, x: u8) -> Result<(), Error> {
        self.i = self.i.wrapping_add(self.v[x as usize] as u16);
        Ok(())
    }

    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    /// FX29 { x: u8 },
    fn assign_i_addr_of_sprite_vx(&mut self, x: u8) -> Result<(), Error> {
        self.i = u16::from(self.v[x as usize]) * GLYPH_HEIGHT;
        Ok(())
    }

    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    /// FX33 { x: u8 },
    fn assign_mem_at_i_bcd_of_vx(&mut self, x: u8) -> Result<(), Error> {
        // I can sit anywhere in the 16-bit range after FX1E, so the
        // bounds arithmetic must not overflow u16
        let start = self.i as usize;
        if start + 2 < self.memory.len() {
            let value = self.v[x as usize];
            self.memory[start] = value / 100u8;
            self.memory[start + 1] = (value % 100) / 10u8;
            self.memory[start + 2] = value % 10u8;
            Ok(())
        } else {
            Err(Error::AddressOutOfRange {
                addr: self.i.saturating_add(2),
                pc: self.pc,
            })
        }
    }

    /// Store the values of registers V0 to VX inclusive in memory starting at address I, I is left unchanged
    /// FX55 { x: u8 },
    fn assign_mem_at_i_v0_to_vx(&mut self, x: u8) -> Result<(), Error> {
        let start = self.i as usize;
        let end = start + x as usize;
        if end >= self.memory.len() {
            return Err(Error::AddressOutOfRange {
                addr: end as u16,
                pc: self.pc,
            });
        }
        for idx in 0..=x as usize {
            self.memory[start + idx] = self.v[idx];
        }
        Ok(())
    }

    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I, I is left unchanged
    /// FX65 { x: u8 },
    fn assign_v0_to_vx_mem_at_i(&mut self, x: u8) -> Result<(), Error> {
        let start = self.i as usize;
        let end = start + x as usize;
        if end >= self.memory.len() {
            return Err(Error::AddressOutOfRange {
                addr: end as u16,
                pc: self.pc,
            });
        }
        for idx in 0..=x as usize {
            self.v[idx] = self.memory[start + idx];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::TestingContext;

    #[test]
    fn pc_incrementation() {
        let mut chip = Chip8::new(TestingContext::new(0));
        assert_eq!(chip.pc, 0x0200u16);
        chip.pc_increment().unwrap();
        assert_eq!(chip.pc, 0x0202u16);
        chip.pc_increment().unwrap();
        assert_eq!(chip.pc, 0x0204u16);
        chip.pc = 0x0FFEu16;
        assert_eq!(
            chip.pc_increment(),
            Err(Error::AddressOutOfRange {
                addr: 0x1000,
                pc: 0x0FFE,
            }),
        );
    }

    #[test]
    fn new_installs_font_at_0x000() {
        let chip = Chip8::new(TestingContext::new(0));
        assert_eq!(&chip.memory[..FONT.len()], &FONT[..]);
        assert!(chip.memory[FONT.len()..].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn load_program_at_start_address() {
        let mut chip = Chip8::new(TestingContext::new(0));
        chip.load_program(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(&chip.memory[0x200..0x204], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(chip.memory[0x204], 0x00);
    }

    #[test]
    fn load_bytes_at_arbitrary_address() {
        let mut chip = Chip8::new(TestingContext::new(0));
        chip.load_bytes(0x300, &[0x42, 0x69]).unwrap();
        assert_eq!(&chip.memory[0x300..0x302], &[0x42, 0x69]);

        assert_eq!(
            chip.load_bytes(0xFFF, &[0x42, 0x69]),
            Err(Error::AddressOutOfRange {
                addr: 0xFFF,
                pc: 0x200,
            }),
        );
    }

    #[test]
    fn fetch_combines_bytes_big_endian() {
        let mut chip = Chip8::new(TestingContext::new(0));
        chip.load_program(&[0x42, 0x69, 0x68, 0x67]);
        assert_eq!(chip.fetch(), Ok(0x4269));

        chip.pc = 0x0FFF;
        assert_eq!(
            chip.fetch(),
            Err(Error::AddressOutOfRange {
                addr: 0x0FFF,
                pc: 0x0FFF,
            }),
        );
    }

    #[test]
    fn tick_chip_halts_on_unknown_instruction() {
        let mut chip = Chip8::new(TestingContext::new(0));
        chip.load_program(&[0x00, 0x69]);
        assert_eq!(
            chip.tick_chip(),
            Err(nb::Error::Other(Error::UnknownInstruction {
                opcode: 0x0069,
                pc: 0x200,
            })),
        );
        // pc still addresses the faulting word
        assert_eq!(chip.pc, 0x200);
    }

    #[test]
    fn tick_timers_drives_sound_edges() {
        let mut chip = Chip8::new(TestingContext::new(0));
        chip.v[0] = 2;
        chip.execute(OpCode::_FX18 { x: 0 }).unwrap();
        assert!(chip.is_sound_active());

        chip.tick_timers();
        assert!(chip.ctx.is_sound_on());
        assert!(chip.is_sound_active());

        chip.tick_timers();
        assert!(!chip.ctx.is_sound_on());
        assert!(!chip.is_sound_active());

        // further ticks clamp at zero
        chip.tick_timers();
        assert!(!chip.ctx.is_sound_on());
    }
}

// Scenarios staged as byte programs and driven through tick_chip
#[cfg(test)]
mod program_tests {
    use super::*;
    use crate::context::testing::TestingContext;

    #[test]
    fn load_vx_6xnn() {
        let mut chip = Chip8::load(TestingContext::new(0), &[0x62, 0x69]);
        chip.tick_chip().unwrap();
        assert_eq!(chip.v[2], 0x69);
        assert_eq!(chip.pc, 0x202);
    }

    #[test]
    fn add_vx_7xnn() {
        let mut chip = Chip8::load(TestingContext::new(0), &[0x72, 0x39]);
        chip.v[2] = 0x30;
        chip.tick_chip().unwrap();
        assert_eq!(chip.v[2], 0x69);
    }

    #[test]
    fn call_and_return_round_trip() {
        // 0x200: call 0x204; 0x204: return
        let mut chip = Chip8::load(TestingContext::new(0), &[0x22, 0x04, 0x00, 0x00, 0x00, 0xEE]);

        chip.tick_chip().unwrap();
        assert_eq!(chip.pc, 0x204);
        assert_eq!(chip.stack.len(), 1);
        assert_eq!(chip.stack[0], 0x200);

        chip.tick_chip().unwrap();
        // back two bytes past the call site, stack drained
        assert_eq!(chip.pc, 0x202);
        assert_eq!(chip.stack.len(), 0);
    }

    #[test]
    fn clear_screen_00e0() {
        let mut chip = Chip8::load(TestingContext::new(0), &[0x00, 0xE0]);
        chip.frame.as_raw_mut()[3] = 0xFF;

        chip.tick_chip().unwrap();
        assert!(chip.frame.view().as_raw().iter().all(|&byte| byte == 0));

        // the display collaborator saw the cleared frame
        let seen = chip.ctx.get_frame().unwrap();
        assert!(seen.view().as_raw().iter().all(|&byte| byte == 0));
    }

    #[test]
    fn masked_random_cxnn_with_zero_mask() {
        let mut chip = Chip8::load(TestingContext::new(0), &[0xC5, 0x00]);
        chip.tick_chip().unwrap();
        assert_eq!(chip.v[5], 0x00);
    }
}
