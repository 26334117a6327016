pub mod config;
pub mod error;
pub mod evaluation;
pub mod geom;
pub mod io;
pub mod optimize;
pub mod project;
pub mod rules;
pub mod solar;
mod uid;
pub mod vecutils;

// Prelude
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use evaluation::{Evaluation, EvaluationRequest, run_evaluation};
pub use geom::site::{SiteGeometry, SiteMetrics};
pub use optimize::{DesignOption, MassingMesh, OptionType};
pub use project::{Occupancy, Project};
pub use rules::{Expression, RuleDefinition, State};
pub use uid::UID;
