// src/lib.rs

pub mod ai;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod routes;
pub mod service;
pub mod session;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
pub mod views;

pub use routes::{student_router, teacher_router};
