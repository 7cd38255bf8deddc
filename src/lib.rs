pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod generator;
pub mod git;
pub mod integrity;
pub mod vault;
