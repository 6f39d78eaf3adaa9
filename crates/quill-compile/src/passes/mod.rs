//! Built-in compilation passes.

pub mod layout;
pub mod routing;

pub use layout::TrivialLayout;
pub use routing::SwapRouting;
