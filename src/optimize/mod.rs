//! Design optimization engine.
//!
//! One run resolves the legal limits of a site, generates the fixed menu of
//! massing candidates, lays housing blocks out inside the site boundary, scores
//! and checks every candidate and ranks the results. Each stage is a pure
//! function of its inputs.

pub mod candidate;
pub mod checks;
pub mod engine;
pub mod jurisdiction;
pub mod layout;
pub mod limits;
pub mod mesh;
pub mod quality;
pub mod result;
pub mod score;

pub use candidate::{Candidate, OptionType, PlanFamily};
pub use checks::ConstraintCheck;
pub use engine::{OptimizeInput, optimize};
pub use jurisdiction::Jurisdiction;
pub use limits::LegalLimits;
pub use mesh::{MassBox, MassingMesh};
pub use quality::QualitativeScores;
pub use result::{DesignOption, OptimizerTimings, OptionParameters};
