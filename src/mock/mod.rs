//! Test doubles for the beacon sending state machine
//!
//! - `MockTransport`: scripted status responses and failures, with call
//!   recording and optional shutdown injection
//! - `ManualClock`: virtual time that records every sleep instead of
//!   blocking, with optional interruption of the n-th sleep
//!
//! Both are deterministic, so the handshake backoff schedule can be
//! verified without waiting hours of wall-clock time.

mod clock;
mod transport;

pub use clock::ManualClock;
pub use transport::{MockReply, MockTransport};
