// Domain types and value objects
mod activity;
mod candle;
mod pair;
mod token;

// Re-export commonly used types to the world
pub use activity::PairActivity;
pub use candle::{Candle, SourceCandle};
pub use pair::PairId;
pub use token::TokenInfo;
