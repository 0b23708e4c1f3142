#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod model;
pub mod results;
pub mod selector;
pub mod time;

pub use time::Clock;
