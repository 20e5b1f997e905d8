//! # VISCA commands
//!
//! A [Command] is everything between the address header and the terminator of
//! a [CommandFrame][crate::CommandFrame]. Variants are selected by their
//! leading bytes, in the same way the camera does.
//!
//! Constructors on [Command] validate their arguments: speeds are rounded and
//! clamped, while positions, preset numbers and actions outside their valid
//! range are rejected.
//!
//! ## Implemented commands
//!
//! Bytes | Command | Notes
//! ----- | ------- | -----
//! `01 06 01` | [PanTiltDrive] | pan/tilt at a speed
//! `01 04 07` | [ZoomDrive] | zoom at a speed
//! `01 04 47` | `ZoomDirect` | zoom to a [Position]
//! `01 04 0B` | [IrisAdjust] | iris up/down/reset
//! `01 04 4B` | `IrisDirect` | iris to a [Position]
//! `01 04 3F` | [Memory] | on-camera presets
//! `01 06 06` | [MenuDisplay] | OSD menu on/off/back
//! `01 7E 01 02 00 01` | `MenuEnter` | OSD menu "ok"
//! `09 04 47` | `ZoomPositionInquiry` |
//! `09 04 4B` | `IrisPositionInquiry` |
//! `09 06 06` | `MenuStatusInquiry` |
//!
//! ## Unimplemented commands
//!
//! Focus, white balance, exposure and the remaining inquiries.
use crate::{
    util::{from_nibbles, round_clamp, to_nibbles},
    Error, Result,
};
use binrw::{binrw, BinRead, BinWrite};
#[cfg(feature = "clap")]
use clap::ValueEnum;
use modular_bitfield::{bitfield, specifiers::B4, Specifier};
use std::str::FromStr;

/// Maximum pan speed.
pub const PAN_MAX_SPEED: u8 = 24;
/// Maximum tilt speed.
pub const TILT_MAX_SPEED: u8 = 20;
/// Maximum zoom speed.
pub const ZOOM_MAX_SPEED: u8 = 7;
/// Maximum zoom position (fully tele).
pub const ZOOM_MAX_POSITION: u16 = 0x4000;
/// Maximum iris position.
pub const IRIS_MAX_POSITION: u16 = 0x11;
/// Highest on-camera preset number.
///
/// VISCA gives presets a single hex digit.
pub const PRESET_MAX_ID: u8 = 0xf;

/// Drive direction for one pan/tilt axis.
#[binrw]
#[brw(repr = u8)]
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum AxisDirection {
    /// Pan left, or tilt down.
    Negative = 0x01,
    /// Pan right, or tilt up.
    Positive = 0x02,
    Stop = 0x03,
}

impl AxisDirection {
    const fn from_speed(speed: i16) -> Self {
        match speed {
            0 => Self::Stop,
            s if s < 0 => Self::Negative,
            _ => Self::Positive,
        }
    }
}

/// `01 06 01`: pan/tilt drive
///
/// The direction of each axis is independent, so this covers the eight
/// diagonal and straight moves, and stopping.
///
/// ## Packet format
///
/// * `u8`: pan speed (`0..=24`)
/// * `u8`: tilt speed (`0..=20`)
/// * `u8`: pan [direction][AxisDirection]
/// * `u8`: tilt [direction][AxisDirection]
#[binrw]
#[brw(big)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PanTiltDrive {
    pub pan_speed: u8,
    pub tilt_speed: u8,
    pub pan: AxisDirection,
    pub tilt: AxisDirection,
}

impl PanTiltDrive {
    /// Builds a drive command from signed speeds.
    ///
    /// Negative pan moves left, negative tilt moves down. Speeds are rounded
    /// and clamped to [PAN_MAX_SPEED] and [TILT_MAX_SPEED].
    pub fn from_velocity(pan_speed: f64, tilt_speed: f64) -> Self {
        let pan_speed = round_clamp(pan_speed, PAN_MAX_SPEED);
        let tilt_speed = round_clamp(tilt_speed, TILT_MAX_SPEED);
        Self {
            pan_speed: pan_speed.unsigned_abs() as u8,
            tilt_speed: tilt_speed.unsigned_abs() as u8,
            pan: AxisDirection::from_speed(pan_speed),
            tilt: AxisDirection::from_speed(tilt_speed),
        }
    }
}

/// Zoom drive direction.
#[derive(Specifier, Debug, PartialEq, Eq, Clone, Copy)]
#[bits = 4]
pub enum ZoomDirection {
    Stop = 0x0,
    /// Zoom in.
    Tele = 0x2,
    /// Zoom out.
    Wide = 0x3,
}

/// `01 04 07`: variable speed zoom
///
/// ## Packet format
///
/// * `u4`: [direction][ZoomDirection] (high nibble)
/// * `u4`: speed, `0..=7` (low nibble)
#[bitfield(bits = 8)]
#[repr(u8)]
#[derive(BinRead, BinWrite, Debug, PartialEq, Eq, Clone, Copy)]
#[br(map = From::<u8>::from)]
#[bw(map = |&x| Into::<u8>::into(x))]
pub struct ZoomDrive {
    pub speed: B4,
    pub direction: ZoomDirection,
}

impl ZoomDrive {
    /// Builds a zoom command from a signed speed.
    ///
    /// Positive zooms in, negative zooms out. The speed is rounded and clamped
    /// to [ZOOM_MAX_SPEED].
    pub fn from_velocity(speed: f64) -> Self {
        let speed = round_clamp(speed, ZOOM_MAX_SPEED);
        let direction = match speed {
            0 => ZoomDirection::Stop,
            s if s < 0 => ZoomDirection::Wide,
            _ => ZoomDirection::Tele,
        };
        Self::new()
            .with_direction(direction)
            .with_speed(speed.unsigned_abs() as u8)
    }
}

/// A lens position, sent as four hex digits, one in the low nibble of each
/// byte.
///
/// ## Packet format
///
/// * `u8; 4`: `0p 0q 0r 0s`
#[binrw]
#[brw(big)]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Position(
    #[br(map = |b: [u8; 4]| from_nibbles(b))]
    #[bw(map = |v: &u16| to_nibbles(*v))]
    pub u16,
);

impl Position {
    fn checked(parameter: &'static str, value: i32, max: u16) -> Result<Self> {
        u16::try_from(value)
            .ok()
            .filter(|v| *v <= max)
            .map(Self)
            .ok_or(Error::out_of_range(parameter, value))
    }
}

/// `01 04 0B`: iris adjustment
#[binrw]
#[brw(repr = u8)]
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[repr(u8)]
pub enum IrisAdjust {
    Reset = 0x00,
    /// Open the iris by one step.
    Widen = 0x02,
    /// Close the iris by one step.
    Narrow = 0x03,
}

/// On-camera preset action.
#[binrw]
#[brw(repr = u8)]
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[repr(u8)]
pub enum PresetAction {
    /// Forget the stored position.
    Clear = 0x00,
    /// Store the current position.
    Set = 0x01,
    /// Move to the stored position.
    Recall = 0x02,
}

impl FromStr for PresetAction {
    type Err = Error;

    /// Parses an action name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "set" => Ok(Self::Set),
            "recall" => Ok(Self::Recall),
            _ => Err(Error::UnknownParameter {
                parameter: "preset action",
                value: s.to_string(),
            }),
        }
    }
}

/// `01 04 3F`: camera memory (on-camera preset)
///
/// ## Packet format
///
/// * `u8`: [action][PresetAction]
/// * `u8`: preset number, `0..=15`
#[binrw]
#[brw(big)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Memory {
    pub action: PresetAction,
    pub preset: u8,
}

impl Memory {
    /// Checks that `preset` is a valid preset number.
    pub fn new(preset: i32, action: PresetAction) -> Result<Self> {
        let preset = u8::try_from(preset)
            .ok()
            .filter(|p| *p <= PRESET_MAX_ID)
            .ok_or(Error::out_of_range("preset ID", preset))?;
        Ok(Self { action, preset })
    }
}

/// `01 06 06`: OSD menu display
#[binrw]
#[brw(repr = u8)]
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum MenuDisplay {
    On = 0x02,
    Off = 0x03,
    Back = 0x10,
}

/// OSD menu action.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
pub enum MenuAction {
    On,
    Off,
    Back,
    Ok,
}

impl FromStr for MenuAction {
    type Err = Error;

    /// Parses an action name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "back" => Ok(Self::Back),
            "ok" => Ok(Self::Ok),
            _ => Err(Error::UnknownParameter {
                parameter: "menu action",
                value: s.to_string(),
            }),
        }
    }
}

#[binrw]
#[brw(big)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command {
    #[brw(magic = b"\x01\x06\x01")]
    PanTiltDrive(PanTiltDrive),
    #[brw(magic = b"\x01\x04\x07")]
    ZoomDrive(ZoomDrive),
    #[brw(magic = b"\x01\x04\x47")]
    ZoomDirect(Position),
    #[brw(magic = b"\x01\x04\x0b")]
    Iris(IrisAdjust),
    #[brw(magic = b"\x01\x04\x4b")]
    IrisDirect(Position),
    #[brw(magic = b"\x01\x04\x3f")]
    Memory(Memory),
    #[brw(magic = b"\x01\x06\x06")]
    MenuDisplay(MenuDisplay),
    #[brw(magic = b"\x01\x7e\x01\x02\x00\x01")]
    MenuEnter,
    #[brw(magic = b"\x09\x04\x47")]
    ZoomPositionInquiry,
    #[brw(magic = b"\x09\x04\x4b")]
    IrisPositionInquiry,
    #[brw(magic = b"\x09\x06\x06")]
    MenuStatusInquiry,
}

impl Command {
    /// Pan and tilt at signed speeds; `(0, 0)` stops.
    pub fn pan_tilt(pan_speed: f64, tilt_speed: f64) -> Self {
        Self::PanTiltDrive(PanTiltDrive::from_velocity(pan_speed, tilt_speed))
    }

    /// Zoom at a signed speed; `0` stops.
    pub fn zoom(speed: f64) -> Self {
        Self::ZoomDrive(ZoomDrive::from_velocity(speed))
    }

    /// Zoom to an absolute position, `0..=16384`.
    pub fn zoom_to(position: i32) -> Result<Self> {
        Position::checked("zoom position", position, ZOOM_MAX_POSITION).map(Self::ZoomDirect)
    }

    /// Set the iris to an absolute position, `0..=17`.
    pub fn iris_to(position: i32) -> Result<Self> {
        Position::checked("iris position", position, IRIS_MAX_POSITION).map(Self::IrisDirect)
    }

    pub fn preset(preset: i32, action: PresetAction) -> Result<Self> {
        Memory::new(preset, action).map(Self::Memory)
    }

    pub const fn menu(action: MenuAction) -> Self {
        match action {
            MenuAction::On => Self::MenuDisplay(MenuDisplay::On),
            MenuAction::Off => Self::MenuDisplay(MenuDisplay::Off),
            MenuAction::Back => Self::MenuDisplay(MenuDisplay::Back),
            MenuAction::Ok => Self::MenuEnter,
        }
    }
}

macro_rules! command_payloads {
    (
        $($variant:ident,)*
    ) => {
        $(
            impl From<$variant> for Command {
                fn from(p: $variant) -> Command {
                    Command::$variant(p)
                }
            }
        )*
    };
}

command_payloads!(PanTiltDrive, ZoomDrive, Memory, MenuDisplay,);

impl From<IrisAdjust> for Command {
    fn from(p: IrisAdjust) -> Command {
        Command::Iris(p)
    }
}
