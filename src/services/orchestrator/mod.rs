mod orchestrator;
mod traits;
mod types;


pub(crate) use orchestrator::*;
pub(crate) use traits::*;
pub(crate) use types::*;
