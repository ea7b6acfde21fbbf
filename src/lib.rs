pub mod cli;
pub mod config;
pub mod engine;
pub mod pathing;
pub mod persistence;
pub mod protocol;
pub mod world;
