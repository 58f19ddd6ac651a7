//! Card statistics and ability weight vectors.

mod block;

pub use block::{Stat, StatBlock, StatWeights};
