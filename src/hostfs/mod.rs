//! Host filesystem access.
//!
//! `RealFs` reads the machine the tests run on; `MockFs` replaces it when a
//! test needs to control what the host appears to contain.

mod mock;
mod traits;

pub use mock::MockFs;
pub use traits::{FileSystem, RealFs};
