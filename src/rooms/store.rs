//! In-memory room settings registry with lazy expiry
//!
//! Entries live for [`ROOM_LIFETIME_MS`] after they were written and are
//! dropped once they are strictly older than that. There is no
//! background timer: expired entries are swept on every access, which keeps
//! the registry small as long as it is used at all. The registry is process
//! local and lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use crate::error::{AppError, Result};

/// Lifetime of a registered room (2 hours)
pub const ROOM_LIFETIME_MS: i64 = 1000 * 60 * 120;

/// Settings stored for a single room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    /// Access code, `None` when the room is open to anyone with the link
    pub code: Option<String>,
    /// Creation time in epoch milliseconds
    pub created_at: i64,
}

/// Why a participant was refused entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// The room has a code and none was supplied
    CodeRequired,
    /// The supplied code does not match
    CodeInvalid,
}

impl AccessDenied {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessDenied::CodeRequired => "code_required",
            AccessDenied::CodeInvalid => "code_invalid",
        }
    }

    pub fn parse(reason: &str) -> Option<Self> {
        match reason {
            "code_required" => Some(AccessDenied::CodeRequired),
            "code_invalid" => Some(AccessDenied::CodeInvalid),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RoomSettings {
    pub fn code_required(&self) -> bool {
        self.code.is_some()
    }

    /// Check a code supplied by a participant against this room
    pub fn check_code(&self, supplied: Option<&str>) -> std::result::Result<(), AccessDenied> {
        let Some(expected) = self.code.as_deref() else {
            return Ok(());
        };
        match normalize_code(supplied) {
            None => Err(AccessDenied::CodeRequired),
            Some(code) if code == expected => Ok(()),
            Some(_) => Err(AccessDenied::CodeInvalid),
        }
    }
}

/// Trim a code, treating blank input as "no code"
pub fn normalize_code(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|c| !c.is_empty())
}

/// Room settings registry
pub struct RoomStore {
    rooms: Mutex<HashMap<String, RoomSettings>>,
    clock: Arc<dyn Clock>,
}

impl RoomStore {
    /// Create a registry backed by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a registry with a custom time source
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Register or overwrite a room
    ///
    /// Fails with [`AppError::InvalidArgument`] when the trimmed name is empty.
    /// Writing sweeps every expired entry first, so other rooms may be
    /// evicted as a side effect.
    pub fn set_room_settings(&self, room_name: &str, code: Option<&str>) -> Result<RoomSettings> {
        let room_name = room_name.trim();
        if room_name.is_empty() {
            return Err(AppError::InvalidArgument(
                "roomName must be a non-empty string".to_string(),
            ));
        }

        let now = self.clock.now_millis();
        let settings = RoomSettings {
            code: normalize_code(code).map(str::to_string),
            created_at: now,
        };

        let mut rooms = self.rooms.lock();
        sweep_expired(&mut rooms, now);
        rooms.insert(room_name.to_string(), settings.clone());
        debug!(
            room = room_name,
            code_required = settings.code_required(),
            "Room registered"
        );

        Ok(settings)
    }

    /// Look up a room, returning `None` when it is unknown or expired
    pub fn get_room_settings(&self, room_name: &str) -> Option<RoomSettings> {
        let room_name = room_name.trim();
        if room_name.is_empty() {
            return None;
        }

        let now = self.clock.now_millis();
        let mut rooms = self.rooms.lock();
        sweep_expired(&mut rooms, now);
        rooms.get(room_name).cloned()
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every room
    pub fn reset(&self) {
        self.rooms.lock().clear();
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sweep_expired(rooms: &mut HashMap<String, RoomSettings>, now: i64) {
    let before = rooms.len();
    rooms.retain(|_, settings| now - settings.created_at <= ROOM_LIFETIME_MS);
    let evicted = before - rooms.len();
    if evicted > 0 {
        debug!(evicted, "Expired rooms evicted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn store_at(clock: &Arc<ManualClock>) -> RoomStore {
        RoomStore::with_clock(clock.clone())
    }

    #[test]
    fn test_stores_trimmed_codes_and_names() {
        let store = RoomStore::new();
        store
            .set_room_settings("  test-room  ", Some("  ABC123  "))
            .unwrap();

        let settings = store.get_room_settings("test-room").unwrap();
        assert_eq!(settings.code.as_deref(), Some("ABC123"));
        assert!(settings.created_at > 0);
    }

    #[test]
    fn test_blank_code_means_no_code() {
        let store = RoomStore::new();
        store.set_room_settings("room-two", Some("   ")).unwrap();

        let settings = store.get_room_settings("room-two").unwrap();
        assert_eq!(settings.code, None);
        assert!(!settings.code_required());
    }

    #[test]
    fn test_empty_name_rejected() {
        let store = RoomStore::new();
        let err = store.set_room_settings("   ", Some("X")).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(store.is_empty());
        assert_eq!(store.get_room_settings("  "), None);
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let store = RoomStore::new();
        store.set_room_settings("dup", Some("first")).unwrap();
        store.set_room_settings(" dup ", Some("second")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get_room_settings("dup").unwrap().code.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let store = RoomStore::new();
        store.set_room_settings("Room", None).unwrap();
        assert!(store.get_room_settings("room").is_none());
        assert!(store.get_room_settings("Room").is_some());
    }

    #[test]
    fn test_created_at_uses_clock() {
        let clock = Arc::new(ManualClock::new(42_000));
        let store = store_at(&clock);
        let settings = store.set_room_settings("r", None).unwrap();
        assert_eq!(settings.created_at, 42_000);
    }

    #[test]
    fn test_expires_after_lifetime() {
        let clock = Arc::new(ManualClock::new(0));
        let store = store_at(&clock);
        store.set_room_settings("short", Some("c")).unwrap();

        clock.set(ROOM_LIFETIME_MS - 1);
        assert!(store.get_room_settings("short").is_some());

        // still valid at exactly created_at + lifetime
        clock.set(ROOM_LIFETIME_MS);
        assert!(store.get_room_settings("short").is_some());

        clock.set(ROOM_LIFETIME_MS + 1);
        assert!(store.get_room_settings("short").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_sweeps_other_rooms() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::at(start));
        let store = store_at(&clock);
        store.set_room_settings("session-x", Some("KEEP")).unwrap();

        clock.advance(ROOM_LIFETIME_MS + 1);
        store.set_room_settings("session-y", Some("NEW")).unwrap();

        // session-x is gone before anyone asked for it
        assert_eq!(store.len(), 1);
        assert!(store.get_room_settings("session-x").is_none());
        assert_eq!(
            store.get_room_settings("session-y").unwrap().code.as_deref(),
            Some("NEW")
        );
    }

    #[test]
    fn test_blank_read_does_not_sweep() {
        let clock = Arc::new(ManualClock::new(0));
        let store = store_at(&clock);
        store.set_room_settings("old", None).unwrap();
        clock.advance(ROOM_LIFETIME_MS * 2);

        assert!(store.get_room_settings("").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reset() {
        let store = RoomStore::new();
        store.set_room_settings("a", None).unwrap();
        store.set_room_settings("b", None).unwrap();
        store.reset();
        assert!(store.is_empty());
    }

    #[test]
    fn test_check_code() {
        let open = RoomSettings {
            code: None,
            created_at: 0,
        };
        assert_eq!(open.check_code(None), Ok(()));
        assert_eq!(open.check_code(Some("anything")), Ok(()));

        let locked = RoomSettings {
            code: Some("ABC".to_string()),
            created_at: 0,
        };
        assert_eq!(locked.check_code(Some(" ABC ")), Ok(()));
        assert_eq!(locked.check_code(None), Err(AccessDenied::CodeRequired));
        assert_eq!(locked.check_code(Some("  ")), Err(AccessDenied::CodeRequired));
        assert_eq!(locked.check_code(Some("abc")), Err(AccessDenied::CodeInvalid));
    }

    #[test]
    fn test_access_denied_reason_roundtrip() {
        for reason in [AccessDenied::CodeRequired, AccessDenied::CodeInvalid] {
            assert_eq!(AccessDenied::parse(reason.as_str()), Some(reason));
        }
        assert_eq!(AccessDenied::parse("nope"), None);
    }
}
