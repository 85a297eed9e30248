//! Core application module
//!
//! This module contains the application entry point and the Cosmic
//! Application implementation driving one translation session.

pub mod app;
