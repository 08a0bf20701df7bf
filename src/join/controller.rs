//! Pre-join state machine
//!
//! Collects a display name and an optional room code, requests connection
//! details and hands them to the call view. Only one request may be in
//! flight; a 403 sends the user back to the code field.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use super::client::{ConnectionDetailsClient, ConnectionRequest, FetchError};
use super::devices::CameraState;
use crate::livekit::ConnectionDetails;
use crate::rooms::AccessDenied;

pub const NAME_REQUIRED_MESSAGE: &str = "Введите имя, чтобы продолжить";
pub const CODE_MISSING_MESSAGE: &str = "Введите код встречи";
pub const CODE_REQUIRED_MESSAGE: &str = "Для входа нужен код";
pub const CODE_INVALID_MESSAGE: &str = "Неверный код";
pub const CONNECT_FAILED_MESSAGE: &str = "Не удалось подключиться к комнате. Попробуйте ещё раз.";
pub const NO_CAMERA_NOTICE: &str = "Камеру не нашли — включение видео будет недоступно.";

/// Devices and name chosen on the pre-join screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUserChoices {
    pub username: String,
    pub video_enabled: bool,
    pub audio_enabled: bool,
    #[serde(default)]
    pub video_device_id: String,
    #[serde(default)]
    pub audio_device_id: String,
}

impl Default for LocalUserChoices {
    fn default() -> Self {
        Self {
            username: String::new(),
            video_enabled: true,
            audio_enabled: true,
            video_device_id: String::new(),
            audio_device_id: String::new(),
        }
    }
}

/// Everything the call view needs once connected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub details: ConnectionDetails,
    pub choices: LocalUserChoices,
}

/// Where the join flow currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinPhase {
    CollectingName,
    /// Code field shown, either required or opened by the user
    CollectingCode,
    Requesting,
    Connected(Box<ActiveSession>),
    /// Request failed; `alert` is shown once and the form is kept
    Error { alert: String },
}

/// Why a submit did not send a request
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("a request is already in flight")]
    Busy,
    #[error("already connected")]
    AlreadyConnected,
    #[error("display name is empty")]
    NameMissing,
    #[error("room code is required")]
    CodeMissing,
}

/// Defaults offered by the pre-join device picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreJoinDefaults {
    pub username: String,
    pub video_enabled: bool,
    pub audio_enabled: bool,
}

/// Join flow state for one room page
#[derive(Debug, Clone)]
pub struct JoinController {
    room_name: String,
    region: Option<String>,
    phase: JoinPhase,
    username: String,
    code: String,
    code_required: bool,
    code_field_visible: bool,
    name_error: Option<String>,
    code_error: Option<String>,
    camera: CameraState,
    device_notice_dismissed: bool,
    /// Code and choices of the request in flight
    pending: Option<(String, LocalUserChoices)>,
}

impl JoinController {
    /// Start the flow for a room. A code taken from the shared link is
    /// pre-filled and marked required.
    pub fn new(
        room_name: impl Into<String>,
        region: Option<String>,
        code_from_url: Option<&str>,
    ) -> Self {
        let mut controller = Self {
            room_name: room_name.into(),
            region: region.filter(|r| !r.trim().is_empty()),
            phase: JoinPhase::CollectingName,
            username: String::new(),
            code: String::new(),
            code_required: false,
            code_field_visible: false,
            name_error: None,
            code_error: None,
            camera: CameraState::Unknown,
            device_notice_dismissed: false,
            pending: None,
        };
        controller.apply_code_from_url(code_from_url.unwrap_or_default());
        controller
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    pub fn phase(&self) -> &JoinPhase {
        &self.phase
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_code_required(&self) -> bool {
        self.code_required
    }

    pub fn is_code_field_visible(&self) -> bool {
        self.code_field_visible
    }

    pub fn name_error(&self) -> Option<&str> {
        self.name_error.as_deref()
    }

    pub fn code_error(&self) -> Option<&str> {
        self.code_error.as_deref()
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self.phase, JoinPhase::Requesting)
    }

    pub fn alert(&self) -> Option<&str> {
        match &self.phase {
            JoinPhase::Error { alert } => Some(alert),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        match &self.phase {
            JoinPhase::Connected(session) => Some(session),
            _ => None,
        }
    }

    /// The shared link changed; a non-empty code forces the code field
    pub fn apply_code_from_url(&mut self, code: &str) {
        self.code = code.to_string();
        if !code.trim().is_empty() {
            self.code_required = true;
            self.code_field_visible = true;
        }
        self.return_to_form();
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
        self.name_error = None;
        self.return_to_form();
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
        self.code_error = None;
        self.return_to_form();
    }

    /// "I have a code"
    pub fn reveal_code_field(&mut self) {
        self.code_field_visible = true;
        self.return_to_form();
    }

    pub fn dismiss_alert(&mut self) {
        if matches!(self.phase, JoinPhase::Error { .. }) {
            self.phase = self.form_phase();
        }
    }

    pub fn camera(&self) -> CameraState {
        self.camera
    }

    /// Record a device probe result. Losing the camera re-arms the notice.
    pub fn set_camera_state(&mut self, camera: CameraState) {
        if camera == CameraState::Missing && self.camera != CameraState::Missing {
            self.device_notice_dismissed = false;
        }
        self.camera = camera;
    }

    /// Notice to show about the camera, if any
    pub fn device_notice(&self) -> Option<&'static str> {
        (self.camera == CameraState::Missing && !self.device_notice_dismissed)
            .then_some(NO_CAMERA_NOTICE)
    }

    pub fn dismiss_device_notice(&mut self) {
        self.device_notice_dismissed = true;
    }

    pub fn pre_join_defaults(&self) -> PreJoinDefaults {
        PreJoinDefaults {
            username: String::new(),
            video_enabled: self.camera.video_allowed(),
            audio_enabled: true,
        }
    }

    /// Whether the join button is enabled
    pub fn can_submit(&self) -> bool {
        !self.is_requesting()
            && !matches!(self.phase, JoinPhase::Connected(_))
            && !self.username.trim().is_empty()
            && !(self.code_field_visible && self.code_required && self.code.trim().is_empty())
    }

    /// Validate the form and enter `Requesting`.
    ///
    /// The display name comes from the controller, devices from `choices`.
    /// Validation failures set a field error and send nothing.
    pub fn begin_submit(
        &mut self,
        choices: LocalUserChoices,
    ) -> Result<ConnectionRequest, SubmitRejected> {
        match self.phase {
            JoinPhase::Requesting => return Err(SubmitRejected::Busy),
            JoinPhase::Connected(_) => return Err(SubmitRejected::AlreadyConnected),
            _ => {}
        }

        let username = self.username.trim().to_string();
        if username.is_empty() {
            self.name_error = Some(NAME_REQUIRED_MESSAGE.to_string());
            return Err(SubmitRejected::NameMissing);
        }
        let code = self.code.trim().to_string();
        if self.code_required && code.is_empty() {
            self.code_error = Some(CODE_MISSING_MESSAGE.to_string());
            return Err(SubmitRejected::CodeMissing);
        }

        let camera_allowed = self.camera.video_allowed();
        let choices = LocalUserChoices {
            username: username.clone(),
            video_enabled: camera_allowed && choices.video_enabled,
            video_device_id: if camera_allowed {
                choices.video_device_id
            } else {
                String::new()
            },
            ..choices
        };

        self.name_error = None;
        self.code_error = None;
        self.phase = JoinPhase::Requesting;

        let request = ConnectionRequest {
            room_name: self.room_name.clone(),
            participant_name: username,
            region: self.region.clone(),
            code: (!code.is_empty()).then(|| code.clone()),
        };
        self.pending = Some((code, choices));
        debug!(room = %self.room_name, "Requesting connection details");

        Ok(request)
    }

    /// Apply the outcome of the request started by [`begin_submit`].
    ///
    /// Ignored unless a request is in flight.
    ///
    /// [`begin_submit`]: Self::begin_submit
    pub fn complete(&mut self, outcome: Result<ConnectionDetails, FetchError>) {
        if !self.is_requesting() {
            debug!("Ignoring stale connection details response");
            return;
        }
        let Some((code, choices)) = self.pending.take() else {
            self.phase = self.form_phase();
            return;
        };

        match outcome {
            Ok(details) => {
                info!(room = %details.room_name, "Connection details received");
                self.code_required = !code.is_empty();
                if self.code_required {
                    self.code_field_visible = true;
                }
                self.code = code;
                self.name_error = None;
                self.code_error = None;
                self.phase = JoinPhase::Connected(Box::new(ActiveSession { details, choices }));
            }
            Err(FetchError::Forbidden { reason }) => {
                let message = match reason {
                    Some(AccessDenied::CodeRequired) => CODE_REQUIRED_MESSAGE,
                    Some(AccessDenied::CodeInvalid) => CODE_INVALID_MESSAGE,
                    // No reason from the server: guess from what was sent
                    None if code.is_empty() => CODE_REQUIRED_MESSAGE,
                    None => CODE_INVALID_MESSAGE,
                };
                self.code_error = Some(message.to_string());
                self.code_required = true;
                self.code_field_visible = true;
                self.phase = JoinPhase::CollectingCode;
            }
            Err(e) => {
                error!("Failed to get connection details: {}", e);
                self.phase = JoinPhase::Error {
                    alert: CONNECT_FAILED_MESSAGE.to_string(),
                };
            }
        }
    }

    /// Run a whole submit: validate, fetch and apply the result
    pub async fn submit(
        &mut self,
        client: &dyn ConnectionDetailsClient,
        choices: LocalUserChoices,
    ) -> Result<&JoinPhase, SubmitRejected> {
        let request = self.begin_submit(choices)?;
        let outcome = client.fetch(&request).await;
        self.complete(outcome);
        Ok(&self.phase)
    }

    fn form_phase(&self) -> JoinPhase {
        if self.code_field_visible {
            JoinPhase::CollectingCode
        } else {
            JoinPhase::CollectingName
        }
    }

    /// Move back to the form after an edit, unless a request is in flight
    /// or the call has started
    fn return_to_form(&mut self) {
        if matches!(
            self.phase,
            JoinPhase::CollectingName | JoinPhase::CollectingCode | JoinPhase::Error { .. }
        ) {
            self.phase = self.form_phase();
        }
    }
}
