//! Vehicle and server state models

mod capabilities;
mod environment;
mod firmware;
mod location;
mod server;
mod stale;
mod status;
mod tpms;

pub use capabilities::*;
pub use environment::*;
pub use firmware::*;
pub use location::*;
pub use server::*;
pub use stale::*;
pub use status::*;
pub use tpms::*;

use crate::error::DecodeError;

/// Apply one parameter tier to `target` atomically
///
/// The tier is decoded into a copy and only committed when every field in
/// it parsed, so a bad value never leaves a group half-updated.
pub(crate) fn apply_tier<S: Clone>(
    target: &mut S,
    decode: impl FnOnce(&mut S) -> Result<(), DecodeError>,
) -> Result<(), DecodeError> {
    let mut next = target.clone();
    decode(&mut next)?;
    *target = next;
    Ok(())
}
