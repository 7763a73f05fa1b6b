//! Hearth - A property listing marketplace backend
//!
//! This library provides the core functionality for the Hearth marketplace API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
