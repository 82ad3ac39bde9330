//! Hand-gesture interface runtime
//!
//! Per-frame hand landmarks come in from an external detector, are built into
//! a [`payload::FramePayload`], and fan out through the
//! [`manager::InterfaceManager`] to gesture interfaces that drive a cursor or
//! an ESP32 over serial.

pub mod adapters;
pub mod calibration;
pub mod config;
pub mod interfaces;
pub mod manager;
pub mod payload;
pub mod payload_builder;
pub mod pipeline;
pub mod source;
pub mod stats;
pub mod time_controller;

#[cfg(test)]
mod test_support;
