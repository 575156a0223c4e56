//! Machine state of the LC-3: register file, address space and keyboard device.
pub mod keyboard;
pub mod memory;
pub mod registers;
