//! Application state modules.

mod status;
mod view;

pub use status::{StatusKind, StatusLine};
pub use view::ViewState;
