pub mod link;
pub mod plan;
pub mod sequencer;

pub use link::{FlightLink, TelloLink};
pub use plan::{FlightCommand, FlightPlan};
pub use sequencer::{fly_plan, CommandPolicy, FlightReport};
