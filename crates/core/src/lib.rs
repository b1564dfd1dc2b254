pub mod decoding;
pub mod detection;
pub mod output;
pub mod pipeline;
pub mod shared;
