//! chesscard: ingest chess games into a deduplicated store, evaluate their
//! positions with a pool of engine workers and derive move-quality views.

pub mod config;
pub mod evaluation;
pub mod persistence;
pub mod service;

#[cfg(test)]
mod testing;

pub use service::{ChessCard, ServiceError};
