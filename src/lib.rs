//! Toastdeck: author toast notifications in an editor session, persist them
//! as a single versioned JSON collection behind a small HTTP API, and let
//! display sessions poll for changes and replay them on screen.

pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod infra;
