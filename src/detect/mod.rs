//! External-executable discovery.
//!
//! [`probe`] validates a single candidate by running it with its version
//! argument; [`ToolLocator`] walks the ordered discovery stages for one
//! tool and hands the result back for the caller to display or persist.

pub mod locator;
pub mod probe;
pub mod tool;

pub use locator::ToolLocator;
pub use probe::DiscoveredExecutable;
pub use tool::ToolKind;
