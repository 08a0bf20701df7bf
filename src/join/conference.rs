//! In-call settings: room options, the camera banner and call events

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::controller::LocalUserChoices;
use super::devices::{
    probe_camera, CameraState, DeviceProbe, MediaDeviceError, MediaDeviceKind,
};

pub const NO_CAMERA_MESSAGE: &str = "Камеру не нашли — включение видео отключено.";

/// Video codecs the media SDK can publish with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    Vp8,
    H264,
    #[default]
    Vp9,
    Av1,
    H265,
}

impl VideoCodec {
    pub const ALL: [VideoCodec; 5] = [
        VideoCodec::Vp8,
        VideoCodec::H264,
        VideoCodec::Vp9,
        VideoCodec::Av1,
        VideoCodec::H265,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoCodec::Vp8 => "vp8",
            VideoCodec::H264 => "h264",
            VideoCodec::Vp9 => "vp9",
            VideoCodec::Av1 => "av1",
            VideoCodec::H265 => "h265",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown video codec '{0}', expected one of: vp8, h264, vp9, av1, h265")]
pub struct UnknownCodec(pub String);

impl FromStr for VideoCodec {
    type Err = UnknownCodec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoCodec::ALL
            .into_iter()
            .find(|codec| codec.as_str() == s)
            .ok_or_else(|| UnknownCodec(s.to_string()))
    }
}

/// Capture/encoding preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPreset {
    pub width: u32,
    pub height: u32,
    pub max_bitrate: u32,
    pub max_framerate: u32,
}

impl VideoPreset {
    const fn new(width: u32, height: u32, max_bitrate: u32, max_framerate: u32) -> Self {
        Self {
            width,
            height,
            max_bitrate,
            max_framerate,
        }
    }

    pub const H216: VideoPreset = VideoPreset::new(384, 216, 180_000, 15);
    pub const H540: VideoPreset = VideoPreset::new(960, 540, 800_000, 25);
    pub const H720: VideoPreset = VideoPreset::new(1280, 720, 1_700_000, 30);
    pub const H1080: VideoPreset = VideoPreset::new(1920, 1080, 3_000_000, 30);
    pub const H2160: VideoPreset = VideoPreset::new(3840, 2160, 8_000_000, 30);
}

/// Page-level call options (`?hq=true&codec=vp9`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConferenceOptions {
    pub hq: bool,
    pub codec: Option<VideoCodec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCaptureOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub resolution: VideoPreset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPublishDefaults {
    pub dtx: bool,
    pub red: bool,
    pub video_codec: VideoCodec,
    pub video_simulcast_layers: Vec<VideoPreset>,
}

/// Options the media SDK room is created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOptions {
    pub video_capture_defaults: VideoCaptureOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_capture_device_id: Option<String>,
    pub publish_defaults: TrackPublishDefaults,
    pub adaptive_stream: bool,
    pub dynacast: bool,
}

impl RoomOptions {
    pub fn new(choices: &LocalUserChoices, options: ConferenceOptions, has_camera: bool) -> Self {
        let (resolution, layers) = if options.hq {
            (VideoPreset::H2160, vec![VideoPreset::H1080, VideoPreset::H720])
        } else {
            (VideoPreset::H720, vec![VideoPreset::H540, VideoPreset::H216])
        };

        Self {
            video_capture_defaults: VideoCaptureOptions {
                device_id: has_camera
                    .then(|| non_empty(&choices.video_device_id))
                    .flatten(),
                resolution,
            },
            audio_capture_device_id: non_empty(&choices.audio_device_id),
            publish_defaults: TrackPublishDefaults {
                dtx: false,
                red: true,
                video_codec: options.codec.unwrap_or_default(),
                video_simulcast_layers: layers,
            },
            adaptive_stream: true,
            dynacast: true,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Which local tracks to enable once connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMediaPlan {
    pub camera: bool,
    pub microphone: bool,
}

impl LocalMediaPlan {
    pub fn new(choices: &LocalUserChoices, has_camera: bool) -> Self {
        Self {
            camera: choices.video_enabled && has_camera,
            microphone: choices.audio_enabled,
        }
    }
}

/// Banner message about devices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceMessage {
    NoCamera,
    Problem(String),
}

impl DeviceMessage {
    pub fn text(&self) -> String {
        match self {
            DeviceMessage::NoCamera => NO_CAMERA_MESSAGE.to_string(),
            DeviceMessage::Problem(message) => format!("Проблема с устройством: {}", message),
        }
    }
}

/// Camera availability and banner state inside the call
#[derive(Debug, Clone)]
pub struct CallDevices {
    has_camera: bool,
    message: Option<DeviceMessage>,
    banner_dismissed: bool,
}

impl CallDevices {
    /// Start from what the pre-join screen found
    pub fn new(camera_available: bool) -> Self {
        let mut devices = Self {
            has_camera: true,
            message: None,
            banner_dismissed: false,
        };
        devices.set_camera_available(camera_available);
        devices
    }

    pub fn has_camera(&self) -> bool {
        self.has_camera
    }

    pub fn message(&self) -> Option<&DeviceMessage> {
        self.message.as_ref()
    }

    /// Banner text, unless dismissed
    pub fn banner(&self) -> Option<String> {
        if self.banner_dismissed {
            return None;
        }
        self.message.as_ref().map(DeviceMessage::text)
    }

    pub fn dismiss_banner(&mut self) {
        self.banner_dismissed = true;
    }

    /// Camera availability handed down from the pre-join screen changed
    pub fn set_camera_available(&mut self, available: bool) {
        self.has_camera = available;
        self.set_message(if available {
            None
        } else {
            Some(DeviceMessage::NoCamera)
        });
    }

    /// Apply a fresh probe. Only the no-camera message is cleared when a
    /// camera shows up; other problems stay visible.
    pub fn apply_probe(&mut self, camera: CameraState) {
        match camera {
            CameraState::Available => {
                self.has_camera = true;
                if self.message == Some(DeviceMessage::NoCamera) {
                    self.set_message(None);
                }
            }
            CameraState::Missing => {
                self.has_camera = false;
                self.set_message(Some(DeviceMessage::NoCamera));
            }
            CameraState::Unknown => {}
        }
    }

    /// Media SDK reported a device error. A camera failure degrades to
    /// "no camera" instead of failing the call. The camera is probed again
    /// afterwards.
    pub async fn on_media_device_error(
        &mut self,
        err: &MediaDeviceError,
        probe: &dyn DeviceProbe,
    ) {
        self.note_device_error(err);
        self.refresh(probe).await;
    }

    /// Re-probe the camera, e.g. after a device change or error
    pub async fn refresh(&mut self, probe: &dyn DeviceProbe) {
        let camera = probe_camera(probe).await;
        if camera == CameraState::Missing {
            warn!("No video input available");
        }
        self.apply_probe(camera);
    }

    fn note_device_error(&mut self, err: &MediaDeviceError) {
        error!("Media device error: {}", err);
        if err.is_camera_missing() {
            self.has_camera = false;
            self.set_message(Some(DeviceMessage::NoCamera));
        } else {
            self.set_message(Some(DeviceMessage::Problem(err.message.clone())));
        }
    }

    fn set_message(&mut self, message: Option<DeviceMessage>) {
        if message.is_some() && message != self.message {
            self.banner_dismissed = false;
        }
        self.message = message;
    }
}

/// Alert shown when the call itself fails
pub fn call_error_alert(message: &str) -> String {
    format!("Произошла ошибка. Подробности смотрите в консоли: {}", message)
}

/// Something the media SDK reported about the running call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// The room connection closed, locally or by the server
    Disconnected,
    ConnectFailed(String),
    MicrophoneFailed(String),
    /// Enabling the camera failed
    CameraFailed(MediaDeviceError),
    MediaDeviceError(MediaDeviceError),
    DevicesChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    InCall,
    /// The participant left; the page goes back to the start screen
    Left,
}

/// State of a joined call: device notices, error alert and leave handling
#[derive(Debug, Clone)]
pub struct CallSession {
    devices: CallDevices,
    video_enabled: bool,
    audio_enabled: bool,
    alert: Option<String>,
    phase: CallPhase,
}

impl CallSession {
    pub fn new(choices: &LocalUserChoices, camera_available: bool) -> Self {
        Self {
            devices: CallDevices::new(camera_available),
            video_enabled: choices.video_enabled,
            audio_enabled: choices.audio_enabled,
            alert: None,
            phase: CallPhase::InCall,
        }
    }

    pub fn devices(&self) -> &CallDevices {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut CallDevices {
        &mut self.devices
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    pub fn has_left(&self) -> bool {
        self.phase == CallPhase::Left
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Tracks to enable, given what is known about the camera right now
    pub fn media_plan(&self) -> LocalMediaPlan {
        LocalMediaPlan {
            camera: self.video_enabled && self.devices.has_camera(),
            microphone: self.audio_enabled,
        }
    }

    /// Apply an event. Events arriving after the participant left are ignored.
    pub async fn handle(&mut self, event: CallEvent, probe: &dyn DeviceProbe) {
        if self.has_left() {
            debug!(?event, "Call event after leave ignored");
            return;
        }

        match event {
            CallEvent::Disconnected => {
                info!("Disconnected from room");
                self.phase = CallPhase::Left;
            }
            CallEvent::ConnectFailed(message) | CallEvent::MicrophoneFailed(message) => {
                error!("Call error: {}", message);
                self.alert = Some(call_error_alert(&message));
            }
            CallEvent::CameraFailed(err) => {
                let err = err.with_kind(MediaDeviceKind::VideoInput);
                self.devices.on_media_device_error(&err, probe).await;
            }
            CallEvent::MediaDeviceError(err) => {
                self.devices.on_media_device_error(&err, probe).await;
            }
            CallEvent::DevicesChanged => self.devices.refresh(probe).await,
        }
    }
}
