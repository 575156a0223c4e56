//! Service routines behind the TRAP instruction, the console I/O system calls of the LC-3.
use crate::errors::ExecutionError;
use crate::hardware::keyboard::KeyboardInputProvider;
use crate::hardware::memory::Memory;
use crate::hardware::registers::{Reg, Registers, from_binary};
use std::io;
use std::io::Write;
use std::ops::ControlFlow;

/// Trap vectors with an implemented service routine.
#[repr(u8)]
#[derive(enumn::N, Copy, Clone, PartialEq, Eq, Debug)]
pub enum TrapVector {
    GetC = 0x20,
    Out = 0x21,
    PutS = 0x22,
    In = 0x23,
    PutSp = 0x24,
    Halt = 0x25,
}

pub const IN_PROMPT: &str = "Enter a character: ";
pub const HALT_MESSAGE: &str = "HALT\n";

fn read_character_from_console(
    regs: &mut Registers,
    keyboard: &mut dyn KeyboardInputProvider,
) -> ControlFlow<Result<(), ExecutionError>, u8> {
    match keyboard.read_input_character() {
        Ok(b) => {
            regs.set(Reg::R0, from_binary(u16::from(b)));
            regs.update_conditional_register(Reg::R0);
            ControlFlow::Continue(b)
        }
        Err(_) if keyboard.is_interrupted() => ControlFlow::Break(Err(ExecutionError::Interrupted)),
        Err(e) => wrap_io_error_in_cf(e),
    }
}

/// GETC: Read a single character from the keyboard. The character is not echoed onto the console.
///
/// Its ASCII code is copied into R0. The high eight bits of R0 are cleared.
pub fn get_c(
    regs: &mut Registers,
    keyboard: &mut dyn KeyboardInputProvider,
) -> ControlFlow<Result<(), ExecutionError>> {
    read_character_from_console(regs, keyboard)?;
    ControlFlow::Continue(())
}

/// IN: Print a prompt on the screen and read a single character echoed back from the keyboard.
///
/// Otherwise, like 0x20 GETC.
pub fn in_trap(
    regs: &mut Registers,
    keyboard: &mut dyn KeyboardInputProvider,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    write_out(IN_PROMPT.as_bytes(), stdout)?;
    let c = read_character_from_console(regs, keyboard)?;
    write_out(&[c], stdout)
}

/// OUT: Write a character in R0[7:0] to the console display.
pub fn out(regs: &Registers, stdout: &mut impl Write) -> ControlFlow<Result<(), ExecutionError>> {
    let [_, low] = regs.get(Reg::R0).as_binary().to_be_bytes();
    write_out(&[low], stdout)
}

fn put_one_char_per_u16(input: u16, append_to: &mut Vec<u8>) {
    let [_, low] = input.to_be_bytes();
    append_to.push(low);
}

fn put_two_chars_per_u16(input: u16, append_to: &mut Vec<u8>) {
    let [high, low] = input.to_be_bytes();
    append_to.push(low);
    if high != 0 {
        append_to.push(high);
    }
}

fn put(
    regs: &Registers,
    mem: &Memory,
    stdout: &mut impl Write,
    handle_char: fn(u16, &mut Vec<u8>),
) -> ControlFlow<Result<(), ExecutionError>> {
    let mut address = regs.get(Reg::R0).as_binary();
    let mut s = Vec::with_capacity(120);
    // at most one pass over the address space if there is no terminating zero
    for _ in 0..=u16::MAX {
        let word = mem[address];
        if word == 0 {
            break;
        }
        handle_char(word, &mut s);
        address = address.wrapping_add(1);
    }
    write_out(&s, stdout)
}

/// PUTS: print null-delimited char* from register 0's address
pub fn put_s(
    regs: &Registers,
    mem: &Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, mem, stdout, put_one_char_per_u16)
}

/// PUTSP: Packed version of PUTS
///
/// The ASCII code contained in bits [7:0] of a memory location is written to the console first.
/// The second character of the last memory location can be 0x00.
/// Writing terminates with a 0x000 char.
pub fn put_sp(
    regs: &Registers,
    mem: &Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, mem, stdout, put_two_chars_per_u16)
}

/// HALT: End program and stdout a message
pub fn halt(stdout: &mut impl Write) -> ControlFlow<Result<(), ExecutionError>> {
    write_out(HALT_MESSAGE.as_bytes(), stdout)?;
    ControlFlow::Break(Ok(()))
}

fn write_out(data: &[u8], stdout: &mut impl Write) -> ControlFlow<Result<(), ExecutionError>> {
    match stdout.write_all(data).and_then(|()| stdout.flush()) {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => wrap_io_error_in_cf(e),
    }
}

fn wrap_io_error_in_cf<T>(error: io::Error) -> ControlFlow<Result<(), ExecutionError>, T> {
    ControlFlow::Break(Err(ExecutionError::Io(error)))
}
