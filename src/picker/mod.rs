//! Stop picker: catalog persistence and the starred/recent list merge shown when
//! the user chooses a stop for a display.

pub mod catalog;
pub mod merge;
pub mod query;

pub use catalog::{StopCatalog, StopEntry};
pub use merge::{PickerItem, merge};
pub use query::{StopQuery, recent, starred};
