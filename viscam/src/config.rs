//! Camera configuration.
//!
//! Configurations are plain [serde] types; loading them from a file is up to
//! the caller.
use crate::{protocol::MAX_ADDRESS, Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, time::Duration};

/// Identifier for a camera, unique within a [CameraManager][crate::CameraManager].
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(pub u32);

impl Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a [CameraLink][crate::CameraLink] is talking to.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CameraIdentity {
    id: CameraId,
    name: String,
    visca_address: u8,
}

impl CameraIdentity {
    /// `name` defaults to the camera ID. `visca_address` must be `0..=7`.
    pub fn new(id: CameraId, name: Option<String>, visca_address: u8) -> Result<Self> {
        if visca_address > MAX_ADDRESS {
            return Err(Error::InvalidConfig(format!(
                "camera {id}: VISCA address {visca_address} is greater than {MAX_ADDRESS}"
            )));
        }
        Ok(Self {
            id,
            name: name.unwrap_or_else(|| id.to_string()),
            visca_address,
        })
    }

    pub fn id(&self) -> CameraId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visca_address(&self) -> u8 {
        self.visca_address
    }
}

/// Scheduling options for a [CameraLink][crate::CameraLink].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LinkOptions {
    /// Maximum number of commands waiting for a reply.
    ///
    /// Most cameras have two command buffers.
    pub concurrency: usize,

    /// How long to wait for a reply to each command.
    pub reply_timeout: Duration,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            concurrency: 2,
            reply_timeout: Duration::from_millis(100),
        }
    }
}

/// TCP connection details.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TcpConfig {
    pub host: String,
    #[serde(default = "TcpConfig::default_port")]
    pub port: u16,
}

impl TcpConfig {
    const fn default_port() -> u16 {
        5678
    }
}

/// Configuration for a single camera.
///
/// ```
/// # use viscam::{CameraConfig, CameraId};
/// let config: CameraConfig = serde_json::from_str(r#"{
///     "id": 3,
///     "friendly_name": "Lectern",
///     "tcp": {"host": "192.0.2.10"}
/// }"#).unwrap();
/// assert_eq!(CameraId(3), config.id);
/// assert_eq!(1, config.visca_address);
/// assert_eq!(5678, config.tcp.unwrap().port);
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    pub id: CameraId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    #[serde(default = "CameraConfig::default_visca_address")]
    pub visca_address: u8,

    /// Connect over TCP. Cameras without this must be connected by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TcpConfig>,

    #[serde(default = "CameraConfig::default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "CameraConfig::default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

impl CameraConfig {
    const fn default_visca_address() -> u8 {
        1
    }

    const fn default_concurrency() -> usize {
        2
    }

    const fn default_reply_timeout_ms() -> u64 {
        100
    }

    pub fn new(id: CameraId) -> Self {
        Self {
            id,
            friendly_name: None,
            visca_address: Self::default_visca_address(),
            tcp: None,
            concurrency: Self::default_concurrency(),
            reply_timeout_ms: Self::default_reply_timeout_ms(),
        }
    }

    pub fn validate(&self) -> Result {
        self.identity()?;
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig(format!(
                "camera {}: concurrency must be at least 1",
                self.id
            )));
        }
        if self.reply_timeout_ms == 0 {
            return Err(Error::InvalidConfig(format!(
                "camera {}: reply timeout must be non-zero",
                self.id
            )));
        }
        Ok(())
    }

    pub fn identity(&self) -> Result<CameraIdentity> {
        CameraIdentity::new(self.id, self.friendly_name.clone(), self.visca_address)
    }

    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            concurrency: self.concurrency,
            reply_timeout: Duration::from_millis(self.reply_timeout_ms),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() -> Result<()> {
        let config: CameraConfig = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(CameraConfig::new(CameraId(1)), config);
        config.validate()?;
        assert_eq!(LinkOptions::default(), config.link_options());

        let identity = config.identity()?;
        assert_eq!("1", identity.name());
        assert_eq!(1, identity.visca_address());
        Ok(())
    }

    #[test]
    fn full() -> Result<()> {
        let config: CameraConfig = serde_json::from_str(
            r#"{
                "id": 2,
                "friendly_name": "Stage left",
                "visca_address": 7,
                "tcp": {"host": "cam2.example", "port": 1259},
                "concurrency": 1,
                "reply_timeout_ms": 250
            }"#,
        )
        .unwrap();
        config.validate()?;
        assert_eq!(
            Some(TcpConfig {
                host: "cam2.example".to_string(),
                port: 1259
            }),
            config.tcp
        );
        assert_eq!(
            LinkOptions {
                concurrency: 1,
                reply_timeout: Duration::from_millis(250),
            },
            config.link_options()
        );
        assert_eq!("Stage left", config.identity()?.name());
        Ok(())
    }

    #[test]
    fn invalid() {
        assert!(serde_json::from_str::<CameraConfig>(r#"{"id": 1, "colour": "red"}"#).is_err());
        assert!(serde_json::from_str::<CameraConfig>(r#"{"friendly_name": "x"}"#).is_err());

        let mut config = CameraConfig::new(CameraId(4));
        config.visca_address = 8;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = CameraConfig::new(CameraId(4));
        config.concurrency = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = CameraConfig::new(CameraId(4));
        config.reply_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        assert!(CameraIdentity::new(CameraId(4), None, 8).is_err());
    }
}
