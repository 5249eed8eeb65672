pub mod diagnostics;
pub mod health;
pub mod note;

pub use diagnostics::*;
pub use health::*;
pub use note::*;
