//! lumentide scheduling library.
//!
//! Exposes the scheduling core for integration testing and external
//! inspection. Everything here is host-portable; hardware-specific
//! output rigs live behind the `ports::LightOutput` trait.

#![deny(unused_must_use)]

pub mod config;
pub mod dimmer;
pub mod display;
pub mod moon;
pub mod output;
pub mod persist;
pub mod ports;
pub mod queues;
pub mod store;
pub mod telemetry;
pub mod timeline;
