pub mod agent;
pub mod behavior;
pub mod color;
pub mod event;
pub mod render;
pub mod metrics;
pub mod simulation;

pub use agent::Agent;
pub use behavior::Behavior;
pub use simulation::{Simulation, SimConfig};
pub use metrics::MetricsCollector;

pub mod prelude {
    pub use crate::agent::{Agent, Arena, Boundary, Point};
    pub use crate::behavior::{Behavior, BehaviorRegistry, Steering};
    pub use crate::event::{Event, EventSource, NoInput, ScriptedInput};
    pub use crate::simulation::{Bridge, Outcome, RunReport, Simulation, SimConfig};
    pub use crate::metrics::StepSnapshot;
}
