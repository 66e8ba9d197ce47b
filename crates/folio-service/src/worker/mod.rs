//! Asynchronous rebuild worker.

pub mod runner;

pub use runner::RebuildWorker;
