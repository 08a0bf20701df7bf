//! gosozvon - video calls with short-lived rooms
//!
//! This crate provides the server side of the call service (room
//! registration with optional access codes, LiveKit connection details and
//! the Telegram inline bot) together with the join flow a room page runs
//! before handing over to the media SDK.

pub mod config;
pub mod error;
pub mod join;
pub mod livekit;
pub mod rooms;
pub mod state;
pub mod telegram;
pub mod web;

pub use error::{AppError, Result};
