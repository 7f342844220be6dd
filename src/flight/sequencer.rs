//! Runs a flight plan against the link, one command at a time.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

use super::link::FlightLink;
use super::plan::{FlightCommand, FlightPlan};

/// What the sequencer does when a command in the plan fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandPolicy {
    /// Log the failure and keep executing the remaining plan.
    Continue,
    /// Stop the plan at the first failure and bring the vehicle down.
    AbortAndLand,
}

/// Outcome of one plan execution.
#[derive(Debug, Default)]
pub struct FlightReport {
    /// Planned commands actually issued, in order.
    pub attempted: usize,
    /// Failures in the order they occurred, including a failed forced
    /// landing.
    pub failures: Vec<Error>,
    /// True when `AbortAndLand` cut the plan short.
    pub aborted: bool,
}

impl FlightReport {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Executes `plan` strictly in order. Each command blocks until the vehicle
/// acks or the link times out; there is no concurrency within the sequence.
pub fn fly_plan<L: FlightLink>(
    link: &mut L,
    plan: &FlightPlan,
    policy: CommandPolicy,
) -> FlightReport {
    let mut report = FlightReport::default();

    for (index, command) in plan.commands().iter().enumerate() {
        info!(step = index + 1, total = plan.len(), %command, "flight step");
        report.attempted += 1;

        let Err(err) = dispatch(link, *command) else {
            continue;
        };
        warn!(%command, "flight command failed: {err}");
        report.failures.push(err);

        match policy {
            CommandPolicy::Continue => {}
            CommandPolicy::AbortAndLand => {
                report.aborted = true;
                if *command != FlightCommand::Land {
                    info!("aborting plan, forcing landing");
                    if let Err(err) = link.land() {
                        warn!("forced landing failed: {err}");
                        report.failures.push(err);
                    }
                }
                break;
            }
        }
    }

    info!(
        attempted = report.attempted,
        failures = report.failures.len(),
        aborted = report.aborted,
        "flight plan finished"
    );
    report
}

fn dispatch<L: FlightLink>(link: &mut L, command: FlightCommand) -> Result<()> {
    match command {
        FlightCommand::TakeOff => link.takeoff(),
        FlightCommand::Forward(cm) => link.move_forward(cm),
        FlightCommand::Back(cm) => link.move_back(cm),
        FlightCommand::Land => link.land(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every command it sees and fails the ones it was told to.
    #[derive(Default)]
    struct ScriptedLink {
        calls: Vec<String>,
        fail_on: Vec<&'static str>,
    }

    impl ScriptedLink {
        fn failing(fail_on: Vec<&'static str>) -> Self {
            Self {
                calls: Vec::new(),
                fail_on,
            }
        }

        fn issue(&mut self, call: String) -> Result<()> {
            let failed = self.fail_on.iter().any(|f| *f == call);
            self.calls.push(call.clone());
            if failed {
                Err(Error::Command {
                    command: call,
                    reason: "scripted failure".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl FlightLink for ScriptedLink {
        fn connect(&mut self) -> Result<()> {
            self.issue("connect".into())
        }
        fn enable_video_stream(&mut self) -> Result<()> {
            self.issue("streamon".into())
        }
        fn takeoff(&mut self) -> Result<()> {
            self.issue("takeoff".into())
        }
        fn land(&mut self) -> Result<()> {
            self.issue("land".into())
        }
        fn move_forward(&mut self, cm: u32) -> Result<()> {
            self.issue(format!("forward {cm}"))
        }
        fn move_back(&mut self, cm: u32) -> Result<()> {
            self.issue(format!("back {cm}"))
        }
    }

    #[test]
    fn issues_plan_in_order() {
        let mut link = ScriptedLink::default();
        let report = fly_plan(
            &mut link,
            &FlightPlan::out_and_back(90),
            CommandPolicy::AbortAndLand,
        );

        assert_eq!(link.calls, ["takeoff", "forward 90", "back 90", "land"]);
        assert_eq!(report.attempted, 4);
        assert!(report.all_ok());
        assert!(!report.aborted);
    }

    #[test]
    fn continue_policy_issues_every_command_once() {
        let mut link = ScriptedLink::failing(vec!["forward 90"]);
        let report = fly_plan(
            &mut link,
            &FlightPlan::out_and_back(90),
            CommandPolicy::Continue,
        );

        // The failed command neither repeats nor skips anything after it.
        assert_eq!(link.calls, ["takeoff", "forward 90", "back 90", "land"]);
        assert_eq!(report.attempted, 4);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.aborted);
    }

    #[test]
    fn abort_policy_stops_and_lands() {
        let mut link = ScriptedLink::failing(vec!["forward 90"]);
        let report = fly_plan(
            &mut link,
            &FlightPlan::out_and_back(90),
            CommandPolicy::AbortAndLand,
        );

        assert_eq!(link.calls, ["takeoff", "forward 90", "land"]);
        assert_eq!(report.attempted, 2);
        assert!(report.aborted);
    }

    #[test]
    fn abort_on_failed_landing_does_not_reland() {
        let mut link = ScriptedLink::failing(vec!["land"]);
        let report = fly_plan(
            &mut link,
            &FlightPlan::out_and_back(90),
            CommandPolicy::AbortAndLand,
        );

        assert_eq!(link.calls, ["takeoff", "forward 90", "back 90", "land"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.aborted);
    }

    #[test]
    fn empty_plan_is_a_noop() {
        let mut link = ScriptedLink::default();
        let report = fly_plan(&mut link, &FlightPlan::new(vec![]), CommandPolicy::Continue);

        assert!(link.calls.is_empty());
        assert_eq!(report.attempted, 0);
        assert!(report.all_ok());
    }
}
