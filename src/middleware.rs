// src/middleware.rs

pub mod auth;
pub mod i18n;
pub mod rbac;
pub mod target;
