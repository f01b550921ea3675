//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the timer route
//! workspace: the `Event` flowing through a route, endpoint URIs, the
//! configuration blueprint, and the sink/formatter traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - A route is driven by a wall-clock timer; each tick produces one `Event`
//! - `sequence` is 1-based per timer run, `fired_at` is UTC

mod blueprint;
mod endpoint;
mod error;
mod event;
mod formatter;
mod report;
mod sink;

pub use blueprint::*;
pub use endpoint::*;
pub use error::*;
pub use event::*;
pub use formatter::*;
pub use report::*;
pub use sink::*;
