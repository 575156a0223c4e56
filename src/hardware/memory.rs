use crate::errors::LoadProgramError;
use crate::hardware::keyboard::KeyboardInputProvider;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::io;
use std::ops::Index;
use std::rc::Rc;

pub const PROGRAM_SECTION_START: u16 = 0x3000;
const MEMORY_SIZE_U16: usize = 1 << 16;

/// Memory regions mapped to IO functionality.
#[repr(u16)]
#[derive(enumn::N, Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemoryMappedIOLocations {
    /// Keyboard Status Register
    Kbsr = 0xFE00,
    /// Keyboard Data Register
    Kbdr = 0xFE02,
}

/// An abstraction for the whole LC-3 address space excluding registers.
pub struct Memory {
    /// Index equals memory address
    data: Box<[u16]>,
    keyboard: Rc<RefCell<dyn KeyboardInputProvider>>,
    failed_polls: u32,
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let used = self.data.iter().filter(|w| **w != 0).count();
        write!(f, "Memory {{ non-zero cells: {used} }}")
    }
}

/// Side effect free access, does not poll the keyboard.
impl Index<u16> for Memory {
    type Output = u16;
    fn index(&self, index: u16) -> &Self::Output {
        &self.data[usize::from(index)]
    }
}

impl Memory {
    const KEYBOARD_STATUS_REGISTER_SET: u16 = 1 << 15;
    const KEYBOARD_STATUS_REGISTER_UNSET: u16 = 0;

    /// Zero-initialized memory sharing the keyboard with the trap routines.
    pub fn new(keyboard: Rc<RefCell<dyn KeyboardInputProvider>>) -> Self {
        Self {
            data: vec![0x0u16; MEMORY_SIZE_U16].into_boxed_slice(),
            keyboard,
            failed_polls: 0,
        }
    }

    /// Reads the cell at `address`.
    ///
    /// Reading the keyboard status register polls the keyboard first: if a key is pending
    /// the status register gets its top bit set and the character is moved to the
    /// keyboard data register, otherwise the status register is cleared.
    pub fn read(&mut self, address: u16) -> u16 {
        if MemoryMappedIOLocations::n(address) == Some(MemoryMappedIOLocations::Kbsr) {
            self.poll_keyboard();
        }
        self[address]
    }

    /// Stores `value` at `address`, device registers included.
    pub fn write(&mut self, address: u16, value: u16) {
        self.data[usize::from(address)] = value;
    }

    fn poll_keyboard(&mut self) {
        let mut keyboard = self.keyboard.borrow_mut();
        let key = match keyboard.check_input_available() {
            Ok(true) => keyboard.read_input_character().map(Some),
            Ok(false) => Ok(None),
            Err(e) => Err(e),
        };
        drop(keyboard);
        match key {
            Ok(Some(c)) => {
                self.write(
                    MemoryMappedIOLocations::Kbsr as u16,
                    Self::KEYBOARD_STATUS_REGISTER_SET,
                );
                self.write(MemoryMappedIOLocations::Kbdr as u16, u16::from(c));
            }
            Ok(None) => self.write(
                MemoryMappedIOLocations::Kbsr as u16,
                Self::KEYBOARD_STATUS_REGISTER_UNSET,
            ),
            Err(e) => {
                // the program keeps polling, so treat it like an idle keyboard
                self.report_failed_poll(&e);
                self.write(
                    MemoryMappedIOLocations::Kbsr as u16,
                    Self::KEYBOARD_STATUS_REGISTER_UNSET,
                );
            }
        }
    }

    /// Copies `words` into consecutive cells starting at `origin`.
    ///
    /// # Errors
    /// - Program too long, it would not fit between `origin` and the end of memory
    pub fn load_image_words(&mut self, origin: u16, words: &[u16]) -> Result<(), LoadProgramError> {
        let start = usize::from(origin);
        let maximum_instructions = MEMORY_SIZE_U16 - start;
        if words.len() > maximum_instructions {
            return Err(LoadProgramError::ProgramTooLong {
                origin,
                actual_instructions: words.len(),
                maximum_instructions,
            });
        }
        self.data[start..start + words.len()].copy_from_slice(words);
        Ok(())
    }

    /// Lets the keyboard collect pending terminal events without consuming a character,
    /// so a CTRL-C is noticed while the program does not read the keyboard.
    pub fn poll_keyboard_events(&mut self) {
        let polled = self.keyboard.borrow_mut().check_input_available();
        if let Err(e) = polled {
            self.report_failed_poll(&e);
        }
    }

    /// Number of keyboard polls which failed so far.
    #[must_use]
    pub const fn failed_polls(&self) -> u32 {
        self.failed_polls
    }

    /// Without a terminal every poll fails, only the first failure is a warning.
    fn report_failed_poll(&mut self, e: &io::Error) {
        self.failed_polls = self.failed_polls.saturating_add(1);
        if self.failed_polls == 1 {
            log::warn!("Polling keyboard failed, treating it as idle: {e}");
        } else {
            log::debug!("Polling keyboard failed {} times: {e}", self.failed_polls);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::test_helpers::FakeKeyboardInputProvider;
    use googletest::prelude::*;

    fn create_memory(input: &str) -> Memory {
        Memory::new(Rc::new(RefCell::new(FakeKeyboardInputProvider::new(input))))
    }

    #[gtest]
    fn test_zero_initialized() {
        let memory = create_memory("");
        expect_that!(memory[0x0000], eq(0));
        expect_that!(memory[0x3000], eq(0));
        expect_that!(memory[0xFFFF], eq(0));
    }

    #[gtest]
    fn test_read_write_any_address() {
        let mut memory = create_memory("");
        memory.write(0x0000, 1);
        memory.write(0xFFFF, 2);
        memory.write(MemoryMappedIOLocations::Kbdr as u16, 3);
        expect_that!(memory.read(0x0000), eq(1));
        expect_that!(memory.read(0xFFFF), eq(2));
        expect_that!(memory.read(0xFE02), eq(3));
    }

    #[gtest]
    fn test_keyboard_status_without_input() {
        let mut memory = create_memory("");
        memory.write(0xFE00, 0x1234);
        expect_that!(memory.read(0xFE00), eq(0));
    }

    #[gtest]
    fn test_keyboard_status_with_input() {
        let mut memory = create_memory("AB");
        let status = memory.read(0xFE00);
        expect_that!(status & 0x8000, eq(0x8000));
        expect_that!(memory.read(0xFE02), eq(u16::from(b'A')));
        // data register is only refreshed by the next status poll
        expect_that!(memory.read(0xFE02), eq(u16::from(b'A')));
        expect_that!(memory.read(0xFE00), eq(0x8000));
        expect_that!(memory.read(0xFE02), eq(u16::from(b'B')));
        expect_that!(memory.read(0xFE00), eq(0));
    }

    #[gtest]
    fn test_keyboard_data_read_does_not_poll() {
        let mut memory = create_memory("A");
        expect_that!(memory.read(0xFE02), eq(0));
        expect_that!(memory[0xFE00], eq(0));
    }

    #[gtest]
    fn test_failing_keyboard_reads_as_idle() {
        let mut memory =
            Memory::new(Rc::new(RefCell::new(FakeKeyboardInputProvider::with_error("no tty"))));
        memory.write(0xFE00, 0x8000);
        expect_that!(memory.read(0xFE00), eq(0));
        expect_that!(memory.read(0xFE00), eq(0));
        memory.poll_keyboard_events();
        expect_that!(memory.failed_polls(), eq(3));
    }

    #[gtest]
    fn test_poll_keyboard_events_keeps_input() {
        let mut memory = create_memory("A");
        memory.poll_keyboard_events();
        expect_that!(memory.failed_polls(), eq(0));
        expect_that!(memory[0xFE00], eq(0));
        expect_that!(memory.read(0xFE00), eq(0x8000));
        expect_that!(memory.read(0xFE02), eq(u16::from(b'A')));
    }

    #[gtest]
    fn test_load_image_words() {
        let mut memory = create_memory("");
        memory.load_image_words(0x3000, &[1, 2, 3]).unwrap();
        assert_eq!(
            [memory[0x3000], memory[0x3001], memory[0x3002], memory[0x3003]],
            [1u16, 2, 3, 0]
        );
        memory.load_image_words(0x3001, &[9]).unwrap();
        assert_eq!([memory[0x3000], memory[0x3001], memory[0x3002]], [1u16, 9, 3]);
    }

    #[gtest]
    fn test_load_image_words_up_to_end_of_memory() {
        let mut memory = create_memory("");
        memory.load_image_words(0xFFFE, &[7, 8]).unwrap();
        expect_that!(memory[0xFFFE], eq(7));
        expect_that!(memory[0xFFFF], eq(8));
    }

    #[gtest]
    fn test_load_image_words_too_long() {
        let mut memory = create_memory("");
        let err = memory.load_image_words(0xFFFE, &[7, 8, 9]).unwrap_err();
        expect_that!(
            err.to_string(),
            eq("Program too long, got 3 u16 instructions while limit from origin 0xFFFE is 2")
        );
        expect_that!(memory[0xFFFE], eq(0));
    }
}
