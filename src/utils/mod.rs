pub mod user_agents;
pub mod validation;

pub use user_agents::*;
pub use validation::*;
