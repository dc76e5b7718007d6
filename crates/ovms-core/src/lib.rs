//! ovms-core - Message and telemetry types for the OVMS relay protocol
//!
//! This crate holds everything about the protocol that does not touch a
//! socket: the `Message` representation shared by inbound and outbound
//! traffic, the vehicle command codes, and the `TelemetryRecord` that
//! inbound messages are decoded into.
//!
//! Decoding is positional and tiered. Each message code carries an ordered
//! list of parameters, and newer vehicle firmware appends fields to the end.
//! A decoder only overwrites the groups of fields the received parameter
//! count covers, so older and newer modules can share one record.

pub mod command;
mod decode;
pub mod error;
pub mod message;
pub mod models;
pub mod telemetry;

pub use command::{Command, CommandResponse, CommandResult};
pub use error::DecodeError;
pub use message::Message;
pub use models::*;
pub use telemetry::TelemetryRecord;
