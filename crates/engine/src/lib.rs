pub mod chart;
pub mod completion;
pub mod error;
pub mod pages;
pub mod prompt;
pub mod session;
pub mod table;
pub mod workflow;

pub use error::WorkflowError;

#[cfg(test)]
pub mod harness;
