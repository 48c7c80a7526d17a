//! `engine` crate — the step sequence and the operation processing engine.

pub mod error;
pub mod locks;
pub mod processor;
pub mod scanner;
pub mod sequence;
pub mod steps;

pub use error::EngineError;
pub use processor::OperationProcessor;
pub use scanner::RecoveryScanner;
pub use sequence::StepSequence;
pub use steps::StepHandler;

#[cfg(test)]
mod processor_tests;
