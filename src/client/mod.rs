//! Client-side sessions: the HTTP API client, the editor and display state
//! machines, and the corner-region toast renderer they drive.

pub mod api;
pub mod display;
pub mod editor;
pub mod screen;
