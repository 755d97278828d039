pub mod classifier;
pub mod model;

pub use classifier::{classify, suites};
pub use model::{Status, Suite, Test, TestError, Totals};
