//! Shared test helpers for `postdeck-core` integration tests.
//!
//! Scripted gateway, in-memory key-value store and a pinned clock so that
//! scheduling tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod fixtures;
pub mod gateway;
