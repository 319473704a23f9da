// src/models/mod.rs

pub mod answer_result;
pub mod exercise;
pub mod quiz;
pub mod user;
pub mod video;
