#![doc = include_str!("../README.md")]

#[macro_use]
extern crate tracing;

mod codec;
mod config;
mod error;
mod link;
mod manager;
mod queue;

pub use {
    crate::{
        codec::ViscaCodec,
        config::{CameraConfig, CameraId, CameraIdentity, LinkOptions, TcpConfig},
        error::Error,
        link::CameraLink,
        manager::CameraManager,
        queue::{Category, CommandQueue},
    },
    viscam_protocol as protocol,
};
pub type Result<T = ()> = std::result::Result<T, Error>;
