//! Skilltree - a skill tree editor core.
//!
//! This crate provides both a CLI application and a library for building
//! skill trees: nodes connected by required and recommended prerequisites,
//! classified as completed, available or locked, edited through a
//! pointer-driven controller and persisted through a [`storage::TreeStorage`]
//! backend.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod controller;
pub mod domain;
pub mod error;
pub mod id_generation;
pub mod layout;
pub mod resolver;
pub mod storage;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

// Application context
pub mod app;

// Output formatting
pub mod output;
