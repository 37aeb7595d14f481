pub mod block;

pub use block::{Block, BlocksResponse, BurnRate, Projection, TokenCounts};
