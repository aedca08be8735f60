//! Pure domain types: monitor addressing, power state, input terminals, and
//! the discovered controller identity.  No I/O lives here.

pub mod identity;
pub mod monitor;
pub mod power;
pub mod terminal;
