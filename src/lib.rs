pub mod body;
pub mod camera;
pub mod config;
pub mod error;
pub mod integrator;
pub mod preset;
pub mod registry;
pub mod types;

pub use body::{Body, BodyTemplate};
pub use camera::Camera;
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use integrator::{Integrator, Merge, StepOutcome};
pub use preset::{BodyRecord, PlanetPresets, Scenario, SimulationPresets};
pub use registry::{Event, Registry};
pub use types::{BodyId, BodySnapshot, ColorDelta, Rgba, SimStats, TracePoint, Vec2};
