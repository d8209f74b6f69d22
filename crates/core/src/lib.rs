#![forbid(unsafe_code)]

pub mod batch;
pub mod elapsed;
pub mod model;
pub mod scoring;
pub mod time;

pub use time::Clock;
