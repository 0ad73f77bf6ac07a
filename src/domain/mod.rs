pub mod error;
pub mod toasts;
