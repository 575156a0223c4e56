//! # LC-3 Virtual Machine.
//!
//! `lc3-vm` runs program images for the LC-3, the 16 bit instructional computer
//! with 8 general purpose registers, 65536 words of memory and a memory mapped keyboard.
//! Usage starts with creating an [`emulator::Emulator`], loading one or more program
//! images and calling [`emulator::Emulator::execute`].
//!
//!  # Example
//! ```
//! use lc3_vm::emulator::Emulator;
//! use lc3_vm::hardware::keyboard::TerminalInputProvider;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let keyboard = Rc::new(RefCell::new(TerminalInputProvider::new()));
//! let mut emu = Emulator::with_io(keyboard, Vec::new());
//! // .ORIG x3000, ADD R0, R0, #5, OUT, HALT
//! emu.load_image_bytes(&[0x30, 0x00, 0x10, 0x25, 0xF0, 0x21, 0xF0, 0x25])?;
//! emu.execute()?;
//! assert_eq!(emu.output().as_slice(), b"\x05HALT\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//! # Errors
//! - Loading: image unreadable, missing `.ORIG` header, image too long for its origin
//! - Execution: reserved opcode, unknown trap vector, console I/O failure, CTRL-C

pub mod emulator;
pub mod errors;
pub mod hardware;
pub(crate) mod numbers;
pub mod terminal;
