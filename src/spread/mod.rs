pub mod engine;
pub mod types;

pub use engine::SpreadEngine;
pub use types::{FeeConfig, Spreads, compute_spreads};
