//! Shared display and input helpers.

pub mod text;
pub mod time;

pub use text::{format_amount, sanitize_input, short_address};
pub use time::{format_duration, format_remaining};
