// src/core/mod.rs
pub mod crypto;
pub mod entities;
pub mod messages;
pub mod session;
