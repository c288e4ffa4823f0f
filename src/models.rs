// src/models.rs

pub mod access;
pub mod auth;
pub mod identity;
pub mod rbac;
pub mod tenancy;
