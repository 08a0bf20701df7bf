//! Short-lived rooms and their access codes

pub mod clock;
pub mod id;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use id::{generate_room_id, new_room_path, random_string};
pub use store::{normalize_code, AccessDenied, RoomSettings, RoomStore, ROOM_LIFETIME_MS};
