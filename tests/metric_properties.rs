//! Property tests over the metric algorithms.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use trainmap::aggregate::group_by;
use trainmap::analytics::scrum::{burndown, rolling_mean};
use trainmap::{Measure, Status, Story};

fn story_with(points: f64, resolved_day: Option<u32>) -> Story {
    Story {
        key: "S".to_string(),
        title: String::new(),
        status: if resolved_day.is_some() {
            Status::Done
        } else {
            Status::InProgress
        },
        raw_status: String::new(),
        feature_key: None,
        team: Some("Platform".to_string()),
        sprint: Some("Sprint 1".to_string()),
        sprint_ordinal: Some(1),
        points: Some(points),
        assignee: None,
        created: None,
        resolved: resolved_day.map(|d| {
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + chrono::Duration::days(d as i64)
        }),
        updated: None,
    }
}

proptest! {
    #[test]
    fn predictability_is_exact_division(
        delivered in 0.0f64..10_000.0,
        committed in 0.01f64..10_000.0,
    ) {
        prop_assert_eq!(
            Measure::ratio(delivered, committed),
            Measure::Defined(delivered / committed)
        );
    }

    #[test]
    fn zero_commitment_is_never_zero_predictability(delivered in 0.0f64..10_000.0) {
        prop_assert_eq!(Measure::ratio(delivered, 0.0), Measure::Insufficient);
    }

    #[test]
    fn rolling_mean_last_element_is_mean_of_tail(
        values in proptest::collection::vec(0.0f64..500.0, 1..30),
        window in 1usize..10,
    ) {
        let rolling = rolling_mean(&values, window);
        prop_assert_eq!(rolling.len(), values.len());

        let tail = &values[values.len().saturating_sub(window)..];
        let expected = tail.iter().sum::<f64>() / tail.len() as f64;
        prop_assert!((rolling.last().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn burndown_is_always_non_increasing(
        stories in proptest::collection::vec(
            (0.5f64..20.0, proptest::option::of(0u32..20)),
            0..15,
        ),
        days in 1u32..20,
    ) {
        let stories: Vec<Story> = stories
            .into_iter()
            .map(|(points, day)| story_with(points, day))
            .collect();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = burndown(&stories, "Platform", "Sprint 1", start, days);

        for pair in series.points.windows(2) {
            prop_assert!(pair[1].remaining_points <= pair[0].remaining_points + 1e-9);
        }
        prop_assert_eq!(series.points.len() as u32, days + 1);
        prop_assert!(series.points[0].remaining_points <= series.scope_points);
    }

    #[test]
    fn group_by_preserves_every_item(items in proptest::collection::vec(0u8..10, 0..50)) {
        let original = items.clone();
        let grouped = group_by(items, |n| *n % 3);

        let mut regrouped: Vec<u8> = grouped.iter().flat_map(|(_, v)| v.clone()).collect();
        regrouped.sort_unstable();
        let mut sorted = original;
        sorted.sort_unstable();
        prop_assert_eq!(regrouped, sorted);
    }
}
