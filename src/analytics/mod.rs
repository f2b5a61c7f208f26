//! Analytics engines: pure functions from normalized issues to metric value
//! objects. Both engines share the grouping primitives in [`crate::aggregate`]
//! so the PI and team views agree on group ordering.

pub mod pi;
pub mod scrum;

pub use pi::{art_scorecards, pi_summary, program_summary, workstream_scorecards, ScorecardOrder};
pub use scrum::{burndown, cycle_time_stats, team_velocity, teams};
