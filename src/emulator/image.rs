//! Program image format: big-endian `u16` words, the first one being the origin.
use crate::errors::LoadProgramError;

/// A decoded program image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub origin: u16,
    pub words: Vec<u16>,
}

impl TryFrom<&[u8]> for Image {
    type Error = LoadProgramError;

    /// A trailing odd byte is ignored.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let mut words = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        let origin = words
            .next()
            .ok_or(LoadProgramError::ProgramMissingOrigHeader)?;
        Ok(Self {
            origin,
            words: words.collect(),
        })
    }
}
