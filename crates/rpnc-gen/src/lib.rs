//! rpnc-gen - AVR Code Generator
//!
//! Maps optimized three-address code to GNU-style AVR assembler source for
//! the ATmega328P. The crate owns the register pool and SRAM layout for
//! one emission run; everything it produces is plain text, assembled
//! downstream with `avr-gcc -mmcu=atmega328p`.

pub mod avr;
pub mod error;
pub mod regs;
pub mod sram;

pub use avr::{AvrGenerator, AvrOptions};
pub use error::CodegenError;
pub use regs::RegisterPool;
pub use sram::SramLayout;
