// src/api/mod.rs
mod applications;

pub use applications::{ApplicationsApi, NotFound};
