pub mod config;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod models;
pub mod navigator;
pub mod normalize;
pub mod scanner;
pub mod sites;
pub mod storage;
pub mod verifier;

#[cfg(test)]
mod testing;
