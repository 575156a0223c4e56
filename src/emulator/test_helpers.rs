use crate::emulator::Emulator;
use crate::hardware::keyboard::KeyboardInputProvider;
use crate::hardware::memory::PROGRAM_SECTION_START;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

/// Keyboard which has all of its input available right from the start, or fails every
/// poll and read when created [`with_error`](Self::with_error).
pub struct FakeKeyboardInputProvider {
    data: VecDeque<u8>,
    read_error: Option<&'static str>,
}
impl FakeKeyboardInputProvider {
    pub fn new(input: &str) -> Self {
        Self {
            data: input.bytes().collect(),
            read_error: None,
        }
    }
    pub fn with_error(message: &'static str) -> Self {
        Self {
            data: VecDeque::new(),
            read_error: Some(message),
        }
    }
}
impl KeyboardInputProvider for FakeKeyboardInputProvider {
    fn check_input_available(&mut self) -> io::Result<bool> {
        if let Some(message) = self.read_error {
            return Err(io::Error::other(message));
        }
        Ok(!self.data.is_empty())
    }
    fn read_input_character(&mut self) -> io::Result<u8> {
        if let Some(message) = self.read_error {
            return Err(io::Error::other(message));
        }
        self.data
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "No input available"))
    }
    fn is_interrupted(&self) -> bool {
        false
    }
}

/// Emulator writing into a byte buffer with `program_no_header` loaded at `0x3000`.
pub fn fake_emulator(program_no_header: &[u16], stdin: &str) -> Emulator<Vec<u8>> {
    let keyboard = Rc::new(RefCell::new(FakeKeyboardInputProvider::new(stdin)));
    let mut emu = Emulator::with_io(keyboard, Vec::new());
    emu.load_program(PROGRAM_SECTION_START, program_no_header)
        .expect("Error loading program");
    emu
}

pub fn output_string(emu: &Emulator<Vec<u8>>) -> String {
    String::from_utf8(emu.output().clone()).unwrap()
}
