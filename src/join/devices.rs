//! Media device availability
//!
//! Device enumeration belongs to the media SDK; this module only decides
//! what an enumeration result means for the call UI.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Kind of a media device, named as in the browser API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaDeviceKind {
    AudioInput,
    AudioOutput,
    VideoInput,
}

/// Enumerated media device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub kind: MediaDeviceKind,
    #[serde(default)]
    pub label: String,
}

/// Error raised by device enumeration or capture
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct MediaDeviceError {
    /// DOM exception name, e.g. `NotFoundError` or `NotAllowedError`
    pub name: String,
    pub message: String,
    /// Device kind involved, when known
    pub kind: Option<MediaDeviceKind>,
}

impl MediaDeviceError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: MediaDeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Whether the error means there is no usable camera
    pub fn is_camera_missing(&self) -> bool {
        self.kind == Some(MediaDeviceKind::VideoInput) || self.name == "NotFoundError"
    }
}

/// Device enumeration provided by the media SDK
#[async_trait]
pub trait DeviceProbe: Send + Sync {
    async fn list_devices(
        &self,
        kind: MediaDeviceKind,
    ) -> Result<Vec<MediaDeviceInfo>, MediaDeviceError>;
}

/// Camera availability as seen by the UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraState {
    /// Not probed yet
    #[default]
    Unknown,
    Available,
    Missing,
}

impl CameraState {
    /// Video may be enabled unless the camera is known to be missing
    pub fn video_allowed(self) -> bool {
        self != CameraState::Missing
    }
}

/// Probe for a video input. A failed probe counts as "no camera".
pub async fn probe_camera(probe: &dyn DeviceProbe) -> CameraState {
    match probe.list_devices(MediaDeviceKind::VideoInput).await {
        Ok(devices) if !devices.is_empty() => CameraState::Available,
        Ok(_) => CameraState::Missing,
        Err(e) => {
            warn!("Failed to enumerate video devices: {}", e);
            CameraState::Missing
        }
    }
}

/// Keep `state` up to date with camera availability.
///
/// Probes once immediately and again on every device-change notification.
/// Returns when the notification channel closes or every receiver of `state`
/// is gone, so results that arrive after the view is torn down are dropped.
pub async fn watch_devices(
    probe: Arc<dyn DeviceProbe>,
    mut changes: mpsc::Receiver<()>,
    state: watch::Sender<CameraState>,
) {
    loop {
        let camera = probe_camera(probe.as_ref()).await;
        if state.send(camera).is_err() {
            debug!("Camera watcher detached");
            return;
        }
        if changes.recv().await.is_none() {
            debug!("Device change notifications closed");
            return;
        }
    }
}
