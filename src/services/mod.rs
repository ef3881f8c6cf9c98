pub mod fetch;
pub mod orchestrator;
pub mod pipeline;
pub mod terms;
pub mod timer;
