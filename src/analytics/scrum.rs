//! Scrum metrics engine: per-team velocity trends, cycle-time distributions,
//! and reconstructed sprint burndowns.
//!
//! Stories reach this engine whether or not their feature link resolves;
//! team-level flow metrics do not care about feature parentage.

use crate::aggregate::group_by;
use crate::config::TrainmapConfig;
use crate::core::{
    parse_sprint_ordinal, BurndownPoint, BurndownSeries, CycleTimeSample, CycleTimeStats,
    Measure, Story, VelocityPoint, VelocitySeries, VelocitySummary, UNASSIGNED_ART,
};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

const SECONDS_PER_DAY: f64 = 86_400.0;

fn team_name(story: &Story) -> &str {
    story.team.as_deref().unwrap_or(UNASSIGNED_ART)
}

/// Distinct team names over a story set, ascending.
pub fn teams(stories: &[Story]) -> Vec<String> {
    let mut names: Vec<String> = group_by(stories.iter(), |s| team_name(s).to_string())
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    names.sort();
    names
}

/// Per-team velocity series with a trailing rolling average.
///
/// Velocity for a sprint is the point sum of its done stories. The series is
/// contiguous over the team's [first..last] sprint ordinal: a sprint where
/// nothing finished contributes a zero point, not a gap. Stories whose sprint
/// label carries no ordinal are left out of the series (the normalizer
/// already counted them), and stories whose ordinal sits further than the
/// configured distance from the team's median ordinal are excluded as
/// outliers, so the series stays proportional to the input rather than to
/// the ordinal span.
pub fn team_velocity(stories: &[Story], config: &TrainmapConfig) -> Vec<VelocitySeries> {
    let window = config.velocity.rolling_window.max(1);
    let max_distance = config.velocity.max_ordinal_distance;
    let in_sprint: Vec<&Story> = stories.iter().filter(|s| s.sprint_ordinal.is_some()).collect();

    group_by(in_sprint, |s| team_name(s).to_string())
        .into_iter()
        .map(|(team, group)| velocity_series(team, &group, window, max_distance))
        .collect()
}

fn velocity_series(
    team: String,
    stories: &[&Story],
    window: usize,
    max_distance: u32,
) -> VelocitySeries {
    let mut ordinals: Vec<u32> = stories.iter().filter_map(|s| s.sprint_ordinal).collect();
    ordinals.sort_unstable();
    let Some(&median) = ordinals.get(ordinals.len() / 2) else {
        return VelocitySeries {
            team,
            points: Vec::new(),
            rolling: Vec::new(),
            window,
            outlier_stories: 0,
            summary: velocity_summary(&[]),
        };
    };

    let mut by_sprint: HashMap<u32, Vec<&Story>> = HashMap::new();
    let mut outliers = 0usize;
    for &story in stories {
        let Some(ordinal) = story.sprint_ordinal else {
            continue;
        };
        if ordinal.abs_diff(median) > max_distance {
            outliers += 1;
            continue;
        }
        by_sprint.entry(ordinal).or_default().push(story);
    }

    // At least the median's own stories survive the distance check.
    let first = by_sprint.keys().min().copied().unwrap_or(median);
    let last = by_sprint.keys().max().copied().unwrap_or(median);

    let points: Vec<VelocityPoint> = (first..=last)
        .map(|sprint| {
            let in_sprint: &[&Story] = by_sprint.get(&sprint).map_or(&[], |v| v.as_slice());
            let planned: f64 = in_sprint.iter().map(|s| s.points_or_zero()).sum();
            let completed: f64 = in_sprint
                .iter()
                .filter(|s| s.status.is_done())
                .map(|s| s.points_or_zero())
                .sum();
            VelocityPoint {
                team: team.clone(),
                sprint,
                completed_points: completed,
                planned_points: planned,
                stories_planned: in_sprint.len(),
                stories_done: in_sprint.iter().filter(|s| s.status.is_done()).count(),
                completion_rate: Measure::ratio(completed, planned),
            }
        })
        .collect();

    let velocities: Vec<f64> = points.iter().map(|p| p.completed_points).collect();
    let rolling = rolling_mean(&velocities, window);
    let summary = velocity_summary(&points);

    VelocitySeries {
        team,
        points,
        rolling,
        window,
        outlier_stories: outliers,
        summary,
    }
}

/// Trailing rolling mean: element i averages the up-to-`window` values
/// ending at i, so partial windows at the start still produce a value.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

fn velocity_summary(points: &[VelocityPoint]) -> VelocitySummary {
    let velocities: Vec<f64> = points.iter().map(|p| p.completed_points).collect();
    let rates: Vec<f64> = points
        .iter()
        .filter_map(|p| p.completion_rate.defined())
        .collect();

    VelocitySummary {
        average_velocity: mean(&velocities),
        last_velocity: velocities
            .last()
            .map_or(Measure::Insufficient, |v| Measure::Defined(*v)),
        completion_rate_mean: mean(&rates),
        completion_rate_stddev: sample_stddev(&rates),
    }
}

fn mean(values: &[f64]) -> Measure<f64> {
    if values.is_empty() {
        Measure::Insufficient
    } else {
        Measure::Defined(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sample_stddev(values: &[f64]) -> Measure<f64> {
    if values.len() < 2 {
        return Measure::Insufficient;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Measure::Defined(variance.sqrt())
}

/// Per-team cycle-time distributions over resolved stories.
///
/// Elapsed time is resolved minus created in fractional calendar days. A
/// story resolved before it was created is a data-quality anomaly: excluded
/// from the statistics, never silently included, and counted per story.
pub fn cycle_time_stats(stories: &[Story], config: &TrainmapConfig) -> Vec<CycleTimeStats> {
    let percentile = config.cycle_time.percentile;

    group_by(stories.iter(), |s| team_name(s).to_string())
        .into_iter()
        .map(|(team, group)| team_cycle_time(team, &group, percentile))
        .collect()
}

fn team_cycle_time(team: String, stories: &[&Story], percentile: u8) -> CycleTimeStats {
    let mut samples = Vec::new();
    let mut in_flight = 0;
    let mut negative = 0;
    let mut missing_created = 0;

    for story in stories {
        let Some(resolved) = story.resolved else {
            in_flight += 1;
            continue;
        };
        let Some(created) = story.created else {
            missing_created += 1;
            continue;
        };
        let days = (resolved - created).num_seconds() as f64 / SECONDS_PER_DAY;
        if days < 0.0 {
            negative += 1;
            continue;
        }
        samples.push(CycleTimeSample {
            key: story.key.clone(),
            days,
            status: story.status,
        });
    }

    let mut days: Vec<f64> = samples.iter().map(|s| s.days).collect();
    days.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    CycleTimeStats {
        team,
        in_flight,
        negative_anomalies: negative,
        missing_created,
        mean_days: mean(&days),
        median_days: median(&days),
        percentile,
        percentile_days: nearest_rank(&days, percentile),
        samples,
    }
}

/// Median over ascending samples; the midpoint of the middle two for even n.
fn median(sorted: &[f64]) -> Measure<f64> {
    let n = sorted.len();
    if n == 0 {
        return Measure::Insufficient;
    }
    if n % 2 == 1 {
        Measure::Defined(sorted[n / 2])
    } else {
        Measure::Defined((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Nearest-rank percentile over ascending samples: the value at rank
/// ceil(p/100 * n).
fn nearest_rank(sorted: &[f64], percentile: u8) -> Measure<f64> {
    if sorted.is_empty() {
        return Measure::Insufficient;
    }
    let rank = (f64::from(percentile) / 100.0 * sorted.len() as f64).ceil() as usize;
    Measure::Defined(sorted[rank.clamp(1, sorted.len()) - 1])
}

/// Reconstruct a sprint burndown from resolution dates.
///
/// No day-by-day snapshot exists, so the trajectory is approximated:
/// remaining on day d is the sprint's point scope minus every story resolved
/// on or before that day. The result is non-increasing by construction, and
/// a final value above zero reports an incomplete sprint.
///
/// Stories match the sprint by ordinal when the requested label carries one,
/// by exact label otherwise.
pub fn burndown(
    stories: &[Story],
    team: &str,
    sprint: &str,
    start: NaiveDate,
    days: u32,
) -> BurndownSeries {
    let ordinal = parse_sprint_ordinal(sprint);
    let in_sprint: Vec<&Story> = stories
        .iter()
        .filter(|s| team_name(s) == team)
        .filter(|s| match ordinal {
            Some(n) => s.sprint_ordinal == Some(n),
            None => s.sprint.as_deref() == Some(sprint),
        })
        .collect();

    let scope: f64 = in_sprint.iter().map(|s| s.points_or_zero()).sum();

    let points = (0..=days)
        .map(|day| {
            let date = start + Duration::days(i64::from(day));
            let resolved: f64 = in_sprint
                .iter()
                .filter(|s| s.resolved.is_some_and(|r| r.date_naive() <= date))
                .map(|s| s.points_or_zero())
                .sum();
            BurndownPoint {
                day,
                date,
                remaining_points: scope - resolved,
                ideal_remaining: ideal_remaining(scope, day, days),
            }
        })
        .collect();

    BurndownSeries {
        team: team.to_string(),
        sprint: sprint.to_string(),
        start,
        days,
        scope_points: scope,
        points,
    }
}

fn ideal_remaining(scope: f64, day: u32, days: u32) -> f64 {
    if days == 0 {
        return scope;
    }
    scope - scope / f64::from(days) * f64::from(day)
}
