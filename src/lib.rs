//! Smartmark: a personal bookmark manager client.
//!
//! A user signs in through an identity provider, then adds, searches and
//! deletes bookmarks kept by a backend collaborator. This library crate
//! exposes all modules for use by the RPC binary and integration tests.

pub mod app;
pub mod backend;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
