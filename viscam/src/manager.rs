//! Registry of camera links.
use crate::{
    config::{CameraConfig, CameraId},
    link::CameraLink,
    Result,
};
use std::collections::{hash_map::Entry, HashMap};

/// Keeps one [CameraLink] per [CameraId].
#[derive(Debug, Default)]
pub struct CameraManager {
    links: HashMap<CameraId, CameraLink>,
}

impl CameraManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a link, keyed by its camera's ID. Returns the link it replaced,
    /// if any.
    pub fn insert(&mut self, link: CameraLink) -> Option<CameraLink> {
        let id = link.identity().id();
        let old = self.links.insert(id, link);
        if old.is_some() {
            warn!("camera {id}: replacing existing link");
        }
        old
    }

    pub fn get(&self, id: CameraId) -> Option<&CameraLink> {
        self.links.get(&id)
    }

    pub fn remove(&mut self, id: CameraId) -> Option<CameraLink> {
        self.links.remove(&id)
    }

    /// IDs of all cameras, in ascending order.
    pub fn ids(&self) -> Vec<CameraId> {
        let mut ids: Vec<_> = self.links.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Connects to a camera over TCP and adds it.
    pub async fn connect(&mut self, config: &CameraConfig) -> Result<&CameraLink> {
        let link = CameraLink::connect_tcp(config).await?;
        Ok(match self.links.entry(config.id) {
            Entry::Occupied(mut e) => {
                warn!("camera {}: replacing existing link", config.id);
                e.insert(link);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(link),
        })
    }

    /// Connects to every camera in `configs` which has TCP connection
    /// details. Stops at the first failure.
    pub async fn connect_all(&mut self, configs: &[CameraConfig]) -> Result {
        for config in configs {
            if config.tcp.is_none() {
                debug!("camera {}: no TCP connection details, skipping", config.id);
                continue;
            }
            self.connect(config).await?;
        }
        Ok(())
    }

    /// Removes links whose connection has failed, returning their IDs.
    pub fn prune_closed(&mut self) -> Vec<CameraId> {
        let mut closed: Vec<_> = self
            .links
            .iter()
            .filter(|(_, link)| link.is_closed())
            .map(|(id, _)| *id)
            .collect();
        closed.sort_unstable();
        for id in &closed {
            info!("camera {id}: link closed, removing");
            self.links.remove(id);
        }
        closed
    }
}
