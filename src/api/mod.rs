pub mod client;
pub mod parser;

pub use client::{StatusClient, StatusSource};
