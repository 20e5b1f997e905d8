//! Controller-to-camera command framing.
use crate::{command::Command, Error, Result};
use binrw::{binrw, io::Cursor, BinRead, BinWrite};

/// Ends every VISCA message, in both directions.
pub const TERMINATOR: u8 = 0xff;

/// Highest addressable camera on a VISCA chain.
pub const MAX_ADDRESS: u8 = 7;

/// Returns the length of the first complete message in `buf`, including its
/// terminator, or `None` if `buf` does not yet hold a whole message.
pub fn frame_length(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|b| *b == TERMINATOR).map(|p| p + 1)
}

/// A command addressed to a camera.
///
/// ## Packet format
///
/// * `u8`: header, `0x80 | address`
/// * [Command] bytes
/// * `u8`: terminator (`0xFF`)
#[binrw]
#[brw(big)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CommandFrame {
    #[br(temp, assert(header & 0xf0 == 0x80 && header & 0x0f <= MAX_ADDRESS))]
    #[bw(calc = 0x80u8 | address)]
    header: u8,

    #[br(calc = header & 0x0f)]
    #[bw(ignore)]
    address: u8,

    pub command: Command,

    #[br(temp, assert(terminator == TERMINATOR))]
    #[bw(calc = TERMINATOR)]
    terminator: u8,
}

impl CommandFrame {
    /// Addresses `command` to the camera at `address` (`0..=7`).
    pub fn new(address: u8, command: Command) -> Result<Self> {
        if address > MAX_ADDRESS {
            return Err(Error::out_of_range("camera address", address));
        }
        Ok(Self { address, command })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Serialises the frame, making sure the terminator only appears at the
    /// end.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::with_capacity(16));
        self.write(&mut out)?;
        let out = out.into_inner();
        match out.split_last() {
            Some((&TERMINATOR, body)) if !body.contains(&TERMINATOR) => Ok(out),
            _ => Err(Error::InvalidFrame),
        }
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        Ok(Self::read(&mut Cursor::new(b))?)
    }
}
