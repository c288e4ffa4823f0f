// src/services.rs

pub mod access_service;
pub mod auth;
pub mod identity_service;
pub mod notifier;
pub mod password;
pub mod token_service;
