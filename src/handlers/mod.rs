// src/handlers/mod.rs

pub mod answer;
pub mod auth;
pub mod exercise;
pub mod profile;
pub mod quiz;
pub mod video;
