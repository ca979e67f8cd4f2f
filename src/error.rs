//! Fatal machine faults.
//!
//! No fault is retried or silently recovered: each one aborts the current
//! step before any of its effects become authoritative, and free-running
//! drivers stop and surface it to the host. Every variant carries the
//! program counter of the faulting instruction.

use core::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// The fetched word does not match any documented opcode pattern.
    UnknownInstruction { opcode: u16, pc: u16 },
    /// A computed memory address fell outside the 4096-byte space.
    AddressOutOfRange { addr: u16, pc: u16 },
    /// A call exceeded the 16 nesting levels of the stack.
    StackOverflow { pc: u16 },
    /// A return was executed with an empty call stack.
    StackUnderflow { pc: u16 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::UnknownInstruction { opcode, pc } => {
                write!(f, "unknown instruction {:#06X} at {:#05X}", opcode, pc)
            }
            Error::AddressOutOfRange { addr, pc } => {
                write!(f, "address {:#06X} out of range at {:#05X}", addr, pc)
            }
            Error::StackOverflow { pc } => write!(f, "call stack overflow at {:#05X}", pc),
            Error::StackUnderflow { pc } => write!(f, "call stack underflow at {:#05X}", pc),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_opcode_and_pc() {
        let err = Error::UnknownInstruction {
            opcode: 0x8BC8,
            pc: 0x0204,
        };
        assert_eq!(
            format!("{}", err),
            "unknown instruction 0x8BC8 at 0x204",
        );
    }
}
