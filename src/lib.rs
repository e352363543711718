pub mod config;
pub mod simulation;
pub mod planner;
pub mod controller;
pub mod driver;

pub use config::*;
pub use simulation::*;
pub use planner::*;
pub use controller::*;
pub use driver::*;
