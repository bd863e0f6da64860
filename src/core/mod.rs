// Core algorithm exports
pub mod aggregate;
pub mod engine;
pub mod solve;

pub use aggregate::{aggregate, MatchError, Overrides};
pub(crate) use aggregate::push_warning;
pub use engine::{MatchEngine, MatchOutcome};
pub use solve::solve;
