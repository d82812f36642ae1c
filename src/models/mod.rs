// src/models/mod.rs

pub mod level;
pub mod question;
pub mod quiz;
pub mod submission;
