pub mod orchestrator;

pub use orchestrator::{
    OrchestratorError, SweepConfig, SweepError, SweepOrchestrator, DEFAULT_GAS_FEE,
};
