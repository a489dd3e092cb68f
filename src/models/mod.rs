pub mod category;
pub mod report;
pub mod snapshot;

pub use category::*;
pub use report::*;
pub use snapshot::*;
