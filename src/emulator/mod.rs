//! The fetch-decode-execute loop of the LC-3 and loading of program images.
pub mod image;
pub mod instruction;
mod opcodes;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod trap_routines;

use crate::emulator::image::Image;
use crate::emulator::instruction::{Instruction, Opcode};
use crate::emulator::trap_routines::TrapVector;
use crate::errors::{ExecutionError, LoadProgramError};
use crate::hardware::keyboard::{KeyboardInputProvider, TerminalInputProvider};
use crate::hardware::memory::Memory;
use crate::hardware::registers::{Reg, Registers};
use crate::terminal::TerminalOutput;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::io::{Stdout, Write, stdout};
use std::ops::ControlFlow;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Instructions between two keyboard polls which detect CTRL-C in programs not reading
/// the keyboard themselves.
const INTERRUPT_POLL_INTERVAL: u32 = 0x1000;

/// Emulator reading the terminal keyboard and writing to stdout.
pub type TerminalEmulator = Emulator<TerminalOutput<Stdout>>;

/// Creates a terminal backed emulator and loads all `paths` in order,
/// later images overwrite earlier ones where they overlap.
///
/// # Errors
/// [`LoadProgramError::ImageRejected`] naming the first image which failed,
/// with the error of [`Emulator::load_image`] as source
pub fn from_images<P: AsRef<Path>>(paths: &[P]) -> Result<TerminalEmulator, LoadProgramError> {
    let mut emu = terminal_emulator();
    for path in paths {
        let path = path.as_ref();
        emu.load_image(path).map_err(|e| LoadProgramError::ImageRejected {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
    }
    Ok(emu)
}

/// Creates an emulator on the terminal keyboard and stdout with empty memory.
#[must_use]
pub fn terminal_emulator() -> TerminalEmulator {
    Emulator::with_io(
        Rc::new(RefCell::new(TerminalInputProvider::new())),
        TerminalOutput::new(stdout()),
    )
}

/// The public facing emulator used to run LC-3 programs.
pub struct Emulator<W: Write> {
    registers: Registers,
    memory: Memory,
    keyboard: Rc<RefCell<dyn KeyboardInputProvider>>,
    output: W,
    running: bool,
    interrupt: Arc<AtomicBool>,
}

impl<W: Write> Debug for Emulator<W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("registers", &self.registers)
            .field("memory", &self.memory)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl<W: Write> Emulator<W> {
    /// Machine in its power-on state: zeroed memory, PC at `0x3000`, condition `Zero`.
    pub fn with_io(keyboard: Rc<RefCell<dyn KeyboardInputProvider>>, output: W) -> Self {
        Self {
            registers: Registers::new(),
            memory: Memory::new(Rc::clone(&keyboard)),
            keyboard,
            output,
            running: true,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Reads a program image file and loads it into memory.
    ///
    /// # Errors
    /// - File cannot be read
    /// - Program is missing valid .ORIG header
    /// - Program too long for its origin
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadProgramError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoadProgramError::ImageUnreadable {
            path: path.display().to_string(),
            source,
        })?;
        self.load_image_bytes(&bytes)
    }

    /// Loads a program image given as raw big-endian bytes, starting with the origin.
    ///
    /// # Errors
    /// - Program is missing valid .ORIG header
    /// - Program too long for its origin
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), LoadProgramError> {
        let image = Image::try_from(bytes)?;
        self.load_program(image.origin, &image.words)
    }

    /// Loads already decoded program words at `origin`.
    ///
    /// # Errors
    /// - Program too long for its origin
    pub fn load_program(&mut self, origin: u16, words: &[u16]) -> Result<(), LoadProgramError> {
        self.memory.load_image_words(origin, words)?;
        log::debug!(
            "Loaded {} words at {origin:#06X}..{:#06X}",
            words.len(),
            usize::from(origin) + words.len()
        );
        Ok(())
    }

    /// Runs until a HALT trap or a fatal error.
    ///
    /// # Errors
    /// - Reserved opcode (RTI or RES) was executed
    /// - Unknown trap vector
    /// - Keyboard input or program output failed
    /// - CTRL-C was pressed or the [interrupt flag](Self::interrupt_flag) was set
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        let mut steps: u32 = 0;
        while self.running {
            if self.is_interrupted() {
                log::info!("Interrupted at PC {:?}", self.registers.pc());
                return Err(ExecutionError::Interrupted);
            }
            if let ControlFlow::Break(res) = self.step() {
                if let Err(e) = &res {
                    log::error!("Execution stopped: {e}, registers: {:?}", self.registers);
                }
                return res;
            }
            steps = steps.wrapping_add(1);
            if steps.is_multiple_of(INTERRUPT_POLL_INTERVAL) {
                self.memory.poll_keyboard_events();
            }
        }
        Ok(())
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed) || self.keyboard.borrow().is_interrupted()
    }

    /// Shared flag which stops [`Emulator::execute`] before the next instruction once set,
    /// for signal handlers.
    #[must_use]
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Fetches, decodes and executes one instruction.
    /// Breaks with `Ok` after HALT and with `Err` on fatal errors.
    pub fn step(&mut self) -> ControlFlow<Result<(), ExecutionError>> {
        let address = self.registers.inc_pc();
        let i = Instruction::from(self.memory.read(address));
        log::trace!("{address:#06X}: {i:?}");
        let r = &mut self.registers;
        match i.op_code() {
            Opcode::Br => opcodes::br(i, r),
            Opcode::Add => opcodes::add(i, r),
            Opcode::Ld => opcodes::ld(i, r, &mut self.memory),
            Opcode::St => opcodes::st(i, r, &mut self.memory),
            Opcode::Jsr => opcodes::jsr(i, r),
            Opcode::And => opcodes::and(i, r),
            Opcode::Ldr => opcodes::ldr(i, r, &mut self.memory),
            Opcode::Str => opcodes::str(i, r, &mut self.memory),
            Opcode::Not => opcodes::not(i, r),
            Opcode::Ldi => opcodes::ldi(i, r, &mut self.memory),
            Opcode::Sti => opcodes::sti(i, r, &mut self.memory),
            Opcode::Jmp => opcodes::jmp_or_ret(i, r),
            Opcode::Lea => opcodes::lea(i, r),
            Opcode::Trap => return self.trap(i, address),
            opcode @ (Opcode::Rti | Opcode::Res) => {
                return ControlFlow::Break(Err(ExecutionError::ReservedOpcode { opcode, address }));
            }
        }
        ControlFlow::Continue(())
    }

    /// TRAP: saves PC in R7 and runs the service routine of the 8 bit trap vector.
    /// ```text
    ///  15__12__11__8__7_______0_
    /// | 1111 | 0000 | trapvect8 |
    ///  -------------------------
    /// ```
    fn trap(&mut self, i: Instruction, address: u16) -> ControlFlow<Result<(), ExecutionError>> {
        self.registers.set(Reg::R7, self.registers.pc());
        let vector = i.trap_vector();
        let Some(trap) = TrapVector::n(vector) else {
            return ControlFlow::Break(Err(ExecutionError::UnknownTrapVector { vector, address }));
        };
        let regs = &mut self.registers;
        let stdout = &mut self.output;
        match trap {
            TrapVector::GetC => trap_routines::get_c(regs, &mut *self.keyboard.borrow_mut()),
            TrapVector::Out => trap_routines::out(regs, stdout),
            TrapVector::PutS => trap_routines::put_s(regs, &self.memory, stdout),
            TrapVector::In => {
                trap_routines::in_trap(regs, &mut *self.keyboard.borrow_mut(), stdout)
            }
            TrapVector::PutSp => trap_routines::put_sp(regs, &self.memory, stdout),
            TrapVector::Halt => {
                let res = trap_routines::halt(stdout);
                self.running = false;
                res
            }
        }
    }

    /// Back to the power-on register state, so the loaded program can run again.
    pub fn reset_registers(&mut self) {
        self.registers = Registers::new();
        self.running = true;
    }
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }
    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }
    pub const fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }
    #[must_use]
    pub const fn output(&self) -> &W {
        &self.output
    }
    pub const fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    #[cfg(test)]
    pub(crate) fn get_parts(
        &mut self,
    ) -> (
        &mut Registers,
        &mut Memory,
        Rc<RefCell<dyn KeyboardInputProvider>>,
        &mut W,
    ) {
        (
            &mut self.registers,
            &mut self.memory,
            Rc::clone(&self.keyboard),
            &mut self.output,
        )
    }
}

/// Drains the output of an in-memory emulator, handy when embedding.
impl Emulator<Vec<u8>> {
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}
