use crate::emulator::instruction::Opcode;
use displaydoc::Display;
use std::error::Error;
use std::io;

/// Errors while loading a program image into memory.
#[derive(Debug, Display)]
pub enum LoadProgramError {
    /// Program image {path} could not be read: {source}
    ImageUnreadable { path: String, source: io::Error },
    /// Program is missing valid .ORIG header
    ProgramMissingOrigHeader,
    /// Program too long, got {actual_instructions} u16 instructions while limit from origin {origin:#06X} is {maximum_instructions}
    ProgramTooLong {
        origin: u16,
        actual_instructions: usize,
        maximum_instructions: usize,
    },
    /// failed to load image: {path}
    ImageRejected {
        path: String,
        source: Box<LoadProgramError>,
    },
}

impl Error for LoadProgramError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ImageUnreadable { source, .. } => Some(source),
            Self::ImageRejected { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Fatal conditions which end the execution of a program.
#[derive(Debug, Display)]
pub enum ExecutionError {
    /// Reserved opcode {opcode:?} at address {address:#06X}
    ReservedOpcode { opcode: Opcode, address: u16 },
    /// Unknown trap vector {vector:#04X} at address {address:#06X}
    UnknownTrapVector { vector: u8, address: u16 },
    /// Error during reading keyboard input or writing program output: {0}
    Io(io::Error),
    /// Execution interrupted by CTRL-C
    Interrupted,
}

impl Error for ExecutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ExecutionError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    fn test_messages() {
        expect_that!(
            ExecutionError::ReservedOpcode {
                opcode: Opcode::Rti,
                address: 0x3001
            }
            .to_string(),
            eq("Reserved opcode Rti at address 0x3001")
        );
        expect_that!(
            ExecutionError::UnknownTrapVector {
                vector: 0x26,
                address: 0x3000
            }
            .to_string(),
            eq("Unknown trap vector 0x26 at address 0x3000")
        );
        expect_that!(
            LoadProgramError::ProgramTooLong {
                origin: 0xFFFE,
                actual_instructions: 3,
                maximum_instructions: 2
            }
            .to_string(),
            eq("Program too long, got 3 u16 instructions while limit from origin 0xFFFE is 2")
        );
    }

    #[gtest]
    fn test_io_source_is_chained() {
        let err = LoadProgramError::ImageUnreadable {
            path: "missing.obj".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        expect_that!(err.source().map(ToString::to_string), some(eq("gone")));
        expect_that!(
            err.to_string(),
            eq("Program image missing.obj could not be read: gone")
        );
    }

    #[gtest]
    fn test_rejected_image_names_path() {
        let err = LoadProgramError::ImageRejected {
            path: "short.obj".into(),
            source: Box::new(LoadProgramError::ProgramMissingOrigHeader),
        };
        expect_that!(err.to_string(), eq("failed to load image: short.obj"));
        expect_that!(
            err.source().map(ToString::to_string),
            some(eq("Program is missing valid .ORIG header"))
        );
    }
}
