//! Request handlers

mod greet;

pub use greet::{greet, GREETING};
