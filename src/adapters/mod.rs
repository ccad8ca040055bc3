//! Adapter implementations of the tracker port.

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
