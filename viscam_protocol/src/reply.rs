//! # Camera replies
//!
//! Cameras answer each command with some mix of an acknowledgement
//! (`y0 4z FF`), a completion (`y0 5z FF`, possibly carrying inquiry data) or
//! an error (`y0 6z ee FF`), where `y` is the camera address plus 8.
//!
//! [classify] sorts received frames into those that belong to the camera and
//! those that don't. It does not try to match a reply to a command; callers
//! hand replies to the oldest outstanding command.
use crate::{command::Position, frame::TERMINATOR, Error, Result};
use binrw::{binrw, io::Cursor, BinRead};
use num_traits::FromPrimitive;
use std::fmt::{Display, Formatter};

/// Error code from a `y0 6z ee FF` reply.
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum ErrorCode {
    MessageLength = 0x01,
    Syntax = 0x02,
    CommandBufferFull = 0x03,
    CommandCancelled = 0x04,
    NoSocket = 0x05,
    CommandNotExecutable = 0x41,
    /// Any other code, or an error reply with no code byte.
    Unknown = 0xff,
}

impl ErrorCode {
    fn from_code(code: Option<u8>) -> Self {
        code.and_then(Self::from_u8).unwrap_or(Self::Unknown)
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MessageLength => "message length error",
            Self::Syntax => "syntax error",
            Self::CommandBufferFull => "command buffer full",
            Self::CommandCancelled => "command cancelled",
            Self::NoSocket => "no socket (to be cancelled)",
            Self::CommandNotExecutable => "command not executable",
            Self::Unknown => "unknown error",
        })
    }
}

/// A reply frame from a camera, including its header and terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply(Vec<u8>);

impl Reply {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Address of the camera which sent the reply.
    pub fn source_address(&self) -> u8 {
        (self.0[0] >> 4) - 8
    }

    /// `true` for an acknowledgement (`y0 4z FF`).
    pub fn is_ack(&self) -> bool {
        self.0.len() == 3 && self.0[1] & 0xf0 == 0x40
    }

    /// Value from a zoom or iris position inquiry reply.
    pub fn position(&self) -> Result<u16> {
        if self.0.len() != 7 {
            return Err(Error::InvalidLength);
        }
        Ok(PositionReply::read(&mut Cursor::new(&self.0))?.position.0)
    }

    /// Value from a menu status inquiry reply (`y0 50 0p FF`).
    ///
    /// `p = 3` means the menu is hidden; anything else means it is showing.
    pub fn menu_showing(&self) -> Result<bool> {
        match self.0.as_slice() {
            [_, 0x50, p, TERMINATOR] => Ok(*p != 0x03),
            [_, _, _, TERMINATOR] => Err(Error::UnexpectedReply),
            _ => Err(Error::InvalidLength),
        }
    }
}

/// Result of [classify].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Not a reply from a camera: echoed commands and noise.
    Foreign,
    /// A non-error reply: acknowledgement, completion or inquiry data.
    Success(Reply),
    /// An error reply.
    Error(ErrorCode),
}

/// Classifies a frame received from a camera.
///
/// Camera replies have a header with a high nibble of `9` to `F` and end with
/// a terminator; everything else is [Classification::Foreign]. A reply is an
/// error when the high nibble of its second byte is `6`, and the error code
/// is the following byte.
pub fn classify(frame: &[u8]) -> Classification {
    let (header, last) = match frame {
        [header, .., last] => (*header, *last),
        _ => return Classification::Foreign,
    };
    if header >> 4 < 0x9 || last != TERMINATOR {
        trace!("foreign frame: {}", hex::encode(frame));
        return Classification::Foreign;
    }

    if frame[1] >> 4 == 0x6 {
        // The code byte is only present if it isn't the terminator.
        let code = if frame.len() >= 4 { Some(frame[2]) } else { None };
        return Classification::Error(ErrorCode::from_code(code));
    }

    Classification::Success(Reply(frame.to_vec()))
}

/// `y0 50 0p 0q 0r 0s FF`: position inquiry reply
///
/// Both zoom and iris position inquiries use this format.
#[binrw]
#[brw(big)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PositionReply {
    #[br(temp, assert(header >= 0x90 && header & 0x0f == 0))]
    #[bw(calc = (source + 8) << 4)]
    header: u8,

    #[br(calc = (header >> 4) - 8)]
    #[bw(ignore)]
    pub source: u8,

    #[br(temp, assert(completion == 0x50))]
    #[bw(calc = 0x50)]
    completion: u8,

    pub position: Position,

    #[br(temp, assert(terminator == TERMINATOR))]
    #[bw(calc = TERMINATOR)]
    terminator: u8,
}

#[cfg(test)]
mod test {
    use super::*;
    use binrw::BinWrite;

    fn classify_hex(h: &str) -> Result<Classification> {
        Ok(classify(&hex::decode(h)?))
    }

    fn success(h: &str) -> Result<Reply> {
        match classify_hex(h)? {
            Classification::Success(r) => Ok(r),
            other => panic!("expected success for {h}, got {other:?}"),
        }
    }

    #[test]
    fn errors() -> Result<()> {
        let _ = tracing_subscriber::fmt().try_init();
        for (h, code) in [
            ("906001ff", ErrorCode::MessageLength),
            ("906002ff", ErrorCode::Syntax),
            ("906003ff", ErrorCode::CommandBufferFull),
            ("906104ff", ErrorCode::CommandCancelled),
            ("906205ff", ErrorCode::NoSocket),
            ("906141ff", ErrorCode::CommandNotExecutable),
            ("a06002ff", ErrorCode::Syntax),
            ("906077ff", ErrorCode::Unknown),
            ("9060ff", ErrorCode::Unknown),
        ] {
            assert_eq!(Classification::Error(code), classify_hex(h)?, "{h}");
        }
        assert_eq!("syntax error", ErrorCode::Syntax.to_string());
        Ok(())
    }

    #[test]
    fn foreign() -> Result<()> {
        let _ = tracing_subscriber::fmt().try_init();
        for h in [
            // Commands echoed on a shared bus
            "8101060602ff",
            "80ff",
            // Broadcast address reply
            "883001ff",
            // Missing terminator
            "9041",
            "ff",
            "",
        ] {
            assert_eq!(Classification::Foreign, classify_hex(h)?, "{h}");
        }
        Ok(())
    }

    #[test]
    fn acknowledgements() -> Result<()> {
        let _ = tracing_subscriber::fmt().try_init();
        let r = success("9041ff")?;
        assert!(r.is_ack());
        assert_eq!(1, r.source_address());

        let r = success("9051ff")?;
        assert!(!r.is_ack());
        assert_eq!(hex::decode("9051ff")?, r.as_bytes());

        let r = success("f051ff")?;
        assert_eq!(7, r.source_address());
        Ok(())
    }

    #[test]
    fn positions() -> Result<()> {
        let _ = tracing_subscriber::fmt().try_init();
        assert_eq!(0x1234, success("905001020304ff")?.position()?);
        assert_eq!(16384, success("905004000000ff")?.position()?);
        assert_eq!(17, success("905000000101ff")?.position()?);

        assert!(success("9051ff")?.position().is_err());
        assert!(success("904101020304ff")?.position().is_err());

        let mut out = Cursor::new(Vec::new());
        PositionReply {
            source: 2,
            position: Position(0x0abc),
        }
        .write(&mut out)?;
        assert_eq!(hex::decode("a050000a0b0cff")?, out.into_inner());
        Ok(())
    }

    #[test]
    fn menu_status() -> Result<()> {
        assert!(!success("905003ff")?.menu_showing()?);
        assert!(success("905002ff")?.menu_showing()?);
        assert!(success("905000ff")?.menu_showing()?);
        assert!(success("9051ff")?.menu_showing().is_err());
        assert!(success("904103ff")?.menu_showing().is_err());
        Ok(())
    }
}
