mod build;
mod load;
mod merge;
mod types;

pub use build::*;
pub use load::*;
pub use merge::*;
pub use types::*;
