//! # mimic-sim
//!
//! Everything that turns an agent into a run: the [`DecisionPolicy`] family,
//! the heuristic components the component policy is assembled from, a
//! scripted [`MockEnvironment`], and the [`SimulationDriver`] that owns the
//! step loop and its audit trail.
//!
//! The driver is the only code that talks to an [`Environment`](mimic_core::Environment).

pub mod components;
pub mod driver;
pub mod env;
pub mod policy;
pub mod recorder;

pub use components::{
    ActionSelector, ClickTopResultSelector, CompositeRelevanceClassifier, CompositeSelector,
    IntentQueryGenerator, KeywordRelevanceClassifier, QueryGenerator, RandomActionSelector,
    RelevanceClassifier, StopOnRelevanceSelector, VariationQueryGenerator, VotingStrategy,
};
pub use driver::{DriverSettings, RunStatus, SimulationDriver, SimulationReport, StepRecord};
pub use env::MockEnvironment;
pub use policy::{CognitiveLoopPolicy, ComponentPolicy, ComponentSettings, DecisionPolicy, FullAgentPolicy, PolicyKind};
pub use recorder::TraceRecorder;
