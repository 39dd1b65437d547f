//! Bounded message history.
//!
//! Each channel keeps its most recent messages in a fixed-capacity ring.
//! Pushing into a full ring overwrites the oldest slot, so memory per
//! channel never grows past its capacity.

mod ring;

pub use ring::CircularHistory;
