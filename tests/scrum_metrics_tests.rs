//! End-to-end scrum metrics: raw export records through the normalizer into
//! velocity, cycle-time, and burndown value objects.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use trainmap::{
    burndown, cycle_time_stats, normalize, team_velocity, teams, Measure, TrainmapConfig,
};

fn story(key: &str, team: &str, sprint: &str, points: f64, status: &str) -> Value {
    json!({
        "key": key,
        "type": "Story",
        "status": status,
        "customfield_20403": team,
        "customfield_11701": sprint,
        "customfield_10003": points,
    })
}

fn resolved_story(key: &str, team: &str, created: &str, resolved: &str) -> Value {
    json!({
        "key": key,
        "type": "Story",
        "status": "Done",
        "customfield_20403": team,
        "customfield_10003": 5.0,
        "created": created,
        "resolved": resolved,
    })
}

#[test]
fn velocity_series_from_raw_export() {
    let records = vec![
        story("S-1", "Platform", "Sprint 1", 5.0, "Done"),
        story("S-2", "Platform", "Sprint 1", 3.0, "In Progress"),
        story("S-3", "Platform", "Sprint 2", 8.0, "Done"),
        story("S-4", "Apps", "Sprint 1", 13.0, "Done"),
    ];
    let config = TrainmapConfig::default();
    let issues = normalize(&records, &config);
    let series = team_velocity(&issues.stories, &config);

    assert_eq!(series.len(), 2);
    assert_eq!(teams(&issues.stories), vec!["Apps", "Platform"]);

    let platform = series.iter().find(|s| s.team == "Platform").unwrap();
    let velocities: Vec<f64> = platform.points.iter().map(|p| p.completed_points).collect();
    assert_eq!(velocities, vec![5.0, 8.0]);
    assert_eq!(platform.rolling, vec![5.0, 6.5]);
}

#[test]
fn rolling_average_covers_last_min_n_sprints() {
    let records: Vec<Value> = (1..=5)
        .map(|n| {
            story(
                &format!("S-{n}"),
                "Platform",
                &format!("Sprint {n}"),
                (n * 10) as f64,
                "Done",
            )
        })
        .collect();
    let config = TrainmapConfig::default(); // window 3
    let issues = normalize(&records, &config);
    let series = team_velocity(&issues.stories, &config);

    // Last element is the mean of the last min(N, n) = 3 raw values.
    let last = *series[0].rolling.last().unwrap();
    assert_eq!(last, (30.0 + 40.0 + 50.0) / 3.0);
    // First element is a partial window of one.
    assert_eq!(series[0].rolling[0], 10.0);
}

#[test]
fn gap_sprints_report_zero_velocity() {
    let records = vec![
        story("S-1", "Platform", "Sprint 2", 5.0, "Done"),
        story("S-2", "Platform", "Sprint 5", 8.0, "Done"),
    ];
    let config = TrainmapConfig::default();
    let issues = normalize(&records, &config);
    let series = team_velocity(&issues.stories, &config);

    let sprints: Vec<u32> = series[0].points.iter().map(|p| p.sprint).collect();
    assert_eq!(sprints, vec![2, 3, 4, 5]);
    assert_eq!(series[0].points[1].completed_points, 0.0);
    // Zero-velocity still appears in the rolling series.
    assert_eq!(series[0].rolling.len(), 4);
}

#[test]
fn cycle_time_is_elapsed_calendar_days() {
    let records = vec![resolved_story(
        "S-1",
        "Platform",
        "2024-01-01",
        "2024-01-04",
    )];
    let config = TrainmapConfig::default();
    let issues = normalize(&records, &config);
    let stats = cycle_time_stats(&issues.stories, &config);

    assert_eq!(stats[0].samples.len(), 1);
    assert_eq!(stats[0].samples[0].days, 3.0);
    assert_eq!(stats[0].mean_days, Measure::Defined(3.0));
}

#[test]
fn negative_cycle_times_count_once_per_story() {
    let records = vec![
        resolved_story("S-1", "Platform", "2024-01-10", "2024-01-04"),
        resolved_story("S-2", "Platform", "2024-01-20", "2024-01-05"),
        resolved_story("S-3", "Platform", "2024-01-01", "2024-01-03"),
    ];
    let config = TrainmapConfig::default();
    let issues = normalize(&records, &config);
    let stats = cycle_time_stats(&issues.stories, &config);

    assert_eq!(stats[0].negative_anomalies, 2);
    assert_eq!(stats[0].samples.len(), 1);
    assert_eq!(stats[0].median_days, Measure::Defined(2.0));
}

#[test]
fn in_flight_stories_are_tallied_not_sampled() {
    let records = vec![
        resolved_story("S-1", "Platform", "2024-01-01", "2024-01-03"),
        json!({
            "key": "S-2",
            "type": "Story",
            "status": "In Progress",
            "customfield_20403": "Platform",
            "created": "2024-01-02",
        }),
    ];
    let config = TrainmapConfig::default();
    let issues = normalize(&records, &config);
    let stats = cycle_time_stats(&issues.stories, &config);

    assert_eq!(stats[0].in_flight, 1);
    assert_eq!(stats[0].samples.len(), 1);
}

#[test]
fn empty_sample_set_reports_insufficient_statistics() {
    let records = vec![json!({
        "key": "S-1",
        "type": "Story",
        "status": "In Progress",
        "customfield_20403": "Platform",
    })];
    let config = TrainmapConfig::default();
    let issues = normalize(&records, &config);
    let stats = cycle_time_stats(&issues.stories, &config);

    assert_eq!(stats[0].mean_days, Measure::Insufficient);
    assert_eq!(stats[0].median_days, Measure::Insufficient);
    assert_eq!(stats[0].percentile_days, Measure::Insufficient);
}

#[test]
fn burndown_reconstruction_from_resolution_dates() {
    let mut s1 = story("S-1", "Platform", "Sprint 3", 5.0, "Done");
    s1["resolved"] = json!("2024-01-03");
    let mut s2 = story("S-2", "Platform", "Sprint 3", 3.0, "Done");
    s2["resolved"] = json!("2024-01-08");
    let s3 = story("S-3", "Platform", "Sprint 3", 2.0, "In Progress");

    let config = TrainmapConfig::default();
    let issues = normalize(&[s1, s2, s3], &config);

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let series = burndown(&issues.stories, "Platform", "Sprint 3", start, 13);

    assert_eq!(series.scope_points, 10.0);
    assert_eq!(series.points.first().unwrap().remaining_points, 10.0);
    assert_eq!(series.final_remaining(), 2.0);
    for pair in series.points.windows(2) {
        assert!(pair[1].remaining_points <= pair[0].remaining_points);
    }
    // Ideal line burns the full scope over exactly the sprint window.
    assert!(series.points.last().unwrap().ideal_remaining.abs() < 1e-9);
}

#[test]
fn dangling_stories_still_feed_team_metrics() {
    let records = vec![json!({
        "key": "S-1",
        "type": "Story",
        "status": "Done",
        "customfield_11702": "F-404",
        "customfield_20403": "Platform",
        "customfield_11701": "Sprint 1",
        "customfield_10003": 5.0,
    })];
    let config = TrainmapConfig::default();
    let issues = normalize(&records, &config);

    assert_eq!(issues.diagnostics.dangling_links, 1);
    let series = team_velocity(&issues.stories, &config);
    assert_eq!(series[0].points[0].completed_points, 5.0);
}
