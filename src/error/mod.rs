mod types;

pub use types::{FrontError, Result};
