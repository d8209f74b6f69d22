#![forbid(unsafe_code)]

pub mod progress;
pub mod repository;
pub mod sqlite;
