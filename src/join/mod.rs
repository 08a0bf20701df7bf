//! Client-side join flow
//!
//! Everything that happens on a room page before and around the media SDK:
//! the pre-join form, the connection-details request and camera handling.
//! The media SDK itself (rooms, tracks, device enumeration) stays behind the
//! [`DeviceProbe`] and [`ConnectionDetailsClient`] seams.

pub mod client;
pub mod conference;
pub mod controller;
pub mod devices;

pub use client::{
    ConnectionDetailsClient, ConnectionRequest, FetchError, HttpConnectionDetailsClient,
    CONN_DETAILS_ENDPOINT,
};
pub use conference::{
    call_error_alert, CallDevices, CallEvent, CallPhase, CallSession, ConferenceOptions,
    DeviceMessage, LocalMediaPlan, RoomOptions, VideoCodec, VideoPreset,
};
pub use controller::{
    ActiveSession, JoinController, JoinPhase, LocalUserChoices, PreJoinDefaults, SubmitRejected,
};
pub use devices::{
    probe_camera, watch_devices, CameraState, DeviceProbe, MediaDeviceError, MediaDeviceInfo,
    MediaDeviceKind,
};

/// Access code carried by a shared link (`?code=...`)
pub fn code_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
}
