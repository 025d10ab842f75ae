pub mod scenario;
pub mod sensitivity;

pub use scenario::{analyze_scenarios, run_standard_scenarios, ScenarioAnalysis, ScenarioDefinition, ScenarioResult};
pub use sensitivity::{tornado, tornado_for, SensitivityParameter, SensitivityRow, TornadoAnalysis};
