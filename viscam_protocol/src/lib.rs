#![doc = include_str!("../README.md")]

#[macro_use]
extern crate num_derive;

#[macro_use]
extern crate tracing;

pub mod command;
mod error;
mod frame;
pub mod reply;
mod util;

pub use crate::{
    command::{Command, MenuAction, PresetAction},
    error::Error,
    frame::{frame_length, CommandFrame, MAX_ADDRESS, TERMINATOR},
    reply::{classify, Classification, ErrorCode, Reply},
};

/// Result type.
pub type Result<T = ()> = std::result::Result<T, Error>;
