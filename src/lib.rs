// src/lib.rs

//! Juris: jurisprudence doctrine harvester library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
