//! Luber API server: accounts, appointments, payments, chat and the
//! conversation hub. The `workers` crate reuses the database, lifecycle,
//! message and notifier modules from here.

pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod lifecycle;
pub mod messages;
pub mod services;
pub mod web;
