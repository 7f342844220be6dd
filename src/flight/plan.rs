use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of a flight plan. Distances are centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightCommand {
    TakeOff,
    Forward(u32),
    Back(u32),
    Land,
}

impl fmt::Display for FlightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightCommand::TakeOff => write!(f, "takeoff"),
            FlightCommand::Forward(cm) => write!(f, "forward {cm}"),
            FlightCommand::Back(cm) => write!(f, "back {cm}"),
            FlightCommand::Land => write!(f, "land"),
        }
    }
}

/// An ordered, immutable command script, executed strictly in sequence with
/// no branching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightPlan {
    commands: Vec<FlightCommand>,
}

impl FlightPlan {
    pub fn new(commands: Vec<FlightCommand>) -> Self {
        Self { commands }
    }

    /// The scripted demo maneuver: up, out, back, down.
    pub fn out_and_back(distance_cm: u32) -> Self {
        Self::new(vec![
            FlightCommand::TakeOff,
            FlightCommand::Forward(distance_cm),
            FlightCommand::Back(distance_cm),
            FlightCommand::Land,
        ])
    }

    pub fn commands(&self) -> &[FlightCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_and_back_is_ordered() {
        let plan = FlightPlan::out_and_back(90);
        assert_eq!(
            plan.commands(),
            &[
                FlightCommand::TakeOff,
                FlightCommand::Forward(90),
                FlightCommand::Back(90),
                FlightCommand::Land,
            ]
        );
    }

    #[test]
    fn commands_render_as_wire_text() {
        assert_eq!(FlightCommand::TakeOff.to_string(), "takeoff");
        assert_eq!(FlightCommand::Forward(90).to_string(), "forward 90");
        assert_eq!(FlightCommand::Back(30).to_string(), "back 30");
        assert_eq!(FlightCommand::Land.to_string(), "land");
    }
}
