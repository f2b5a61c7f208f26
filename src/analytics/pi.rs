//! PI analytics engine: commitment-vs-delivery rollups, predictability, and
//! composite health scores per ART or workstream.
//!
//! All functions here are pure over their inputs. Grouping goes through
//! [`crate::aggregate::group_by`] so scorecard order matches the other views:
//! first ascending by group name, optionally re-sorted by health.

use crate::aggregate::group_by;
use crate::config::TrainmapConfig;
use crate::core::{
    ArtScorecard, Feature, HealthScore, Measure, PiSummary, ProgramSummary, Story,
};
use std::collections::HashSet;

/// Scorecard ordering. ART name ascending is the default; Health sorts the
/// worst cards last so terminal output ends on the trouble spots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScorecardOrder {
    #[default]
    ArtName,
    Health,
}

/// One scorecard per ART, rolled up across its workstreams.
pub fn art_scorecards(
    features: &[Feature],
    config: &TrainmapConfig,
    order: ScorecardOrder,
) -> Vec<ArtScorecard> {
    let groups = group_by(features.iter(), |f| f.art_name().to_string());
    let mut cards: Vec<ArtScorecard> = groups
        .into_iter()
        .map(|(art, group)| scorecard(art, None, &group, config))
        .collect();
    sort_cards(&mut cards, order);
    cards
}

/// The unrolled view: one scorecard per (ART, workstream) pair, from the
/// same grouping primitive as the ART rollup. Features without a workstream
/// group under None.
pub fn workstream_scorecards(
    features: &[Feature],
    config: &TrainmapConfig,
    order: ScorecardOrder,
) -> Vec<ArtScorecard> {
    let groups = group_by(features.iter(), |f| {
        (f.art_name().to_string(), f.workstream.clone())
    });
    let mut cards: Vec<ArtScorecard> = groups
        .into_iter()
        .map(|((art, workstream), group)| scorecard(art, workstream, &group, config))
        .collect();
    sort_cards(&mut cards, order);
    cards
}

fn sort_cards(cards: &mut [ArtScorecard], order: ScorecardOrder) {
    cards.sort_by(|a, b| (&a.art, &a.workstream).cmp(&(&b.art, &b.workstream)));
    if order == ScorecardOrder::Health {
        // Descending by score; cards without a score sink to the end.
        cards.sort_by(|a, b| {
            let score = |c: &ArtScorecard| c.health.score.defined().unwrap_or(-1.0);
            score(b).partial_cmp(&score(a)).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

fn scorecard(
    art: String,
    workstream: Option<String>,
    group: &[&Feature],
    config: &TrainmapConfig,
) -> ArtScorecard {
    // Committed counts every feature in the group; delivered only counts
    // features that reached a done status by evaluation time.
    let committed: f64 = group.iter().map(|f| f.committed_points).sum();
    let delivered: f64 = group
        .iter()
        .filter(|f| f.status.is_done())
        .map(|f| f.delivered_points)
        .sum();
    let done = group.iter().filter(|f| f.status.is_done()).count();

    let workstreams: HashSet<&str> = group
        .iter()
        .filter_map(|f| f.workstream.as_deref())
        .collect();

    ArtScorecard {
        art,
        workstream,
        feature_count: group.len(),
        done_feature_count: done,
        workstream_count: workstreams.len(),
        committed_points: committed,
        delivered_points: delivered,
        predictability: Measure::ratio(delivered, committed),
        health: health_score(group, committed, delivered, done, config),
    }
}

/// Composite health on a 0-100 scale: a weighted average of capped
/// predictability, feature completion, and the on-track ratio.
///
/// A sub-score whose inputs are absent (no commitment, no due-date data, no
/// configured PI end) drops out and the remaining weights renormalize, so
/// missing data neither inflates nor sinks the score. With all three absent
/// the score is Insufficient.
fn health_score(
    group: &[&Feature],
    committed: f64,
    delivered: f64,
    done: usize,
    config: &TrainmapConfig,
) -> HealthScore {
    let weights = &config.health;

    // Capped at 1.0 for scoring only; the scorecard keeps the raw ratio.
    let predictability = Measure::ratio(delivered, committed).map(|r| r.min(1.0));
    let completion = Measure::ratio(done as f64, group.len() as f64);
    let on_track = on_track_ratio(group, config);

    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    for (sub, weight) in [
        (predictability, weights.predictability),
        (completion, weights.completion),
        (on_track, weights.on_track),
    ] {
        if let Measure::Defined(value) = sub {
            weighted += value * weight;
            weight_sum += weight;
        }
    }

    let score = if weight_sum > 0.0 {
        Measure::Defined(weighted / weight_sum * 100.0)
    } else {
        Measure::Insufficient
    };

    HealthScore {
        score,
        band: score.defined().map(|s| weights.bands.classify(s)),
        predictability,
        completion,
        on_track,
    }
}

/// Share of due-dated features that are still on track: done, or due on or
/// before the configured PI end. Undefined without a PI end date or when no
/// feature in the group carries a due date.
fn on_track_ratio(group: &[&Feature], config: &TrainmapConfig) -> Measure<f64> {
    let Some(pi_end) = config.pi.end_date else {
        return Measure::Insufficient;
    };
    let dated: Vec<_> = group.iter().filter(|f| f.due_date.is_some()).collect();
    let on_track = dated
        .iter()
        .filter(|f| f.status.is_done() || f.due_date.is_some_and(|due| due <= pi_end))
        .count();
    Measure::ratio(on_track as f64, dated.len() as f64)
}

/// Program-level totals across every ART of the selected PI.
pub fn program_summary(pi_label: &str, cards: &[ArtScorecard]) -> ProgramSummary {
    let committed: f64 = cards.iter().map(|c| c.committed_points).sum();
    let delivered: f64 = cards.iter().map(|c| c.delivered_points).sum();
    ProgramSummary {
        pi_label: pi_label.to_string(),
        art_count: cards.len(),
        feature_count: cards.iter().map(|c| c.feature_count).sum(),
        done_feature_count: cards.iter().map(|c| c.done_feature_count).sum(),
        committed_points: committed,
        delivered_points: delivered,
        predictability: Measure::ratio(delivered, committed),
    }
}

/// Feature/story/point completion for one PI, optionally narrowed to a
/// workstream. Stories count via their parent feature's membership in the
/// feature set, so dangling stories stay out of this view.
pub fn pi_summary(
    pi_label: &str,
    features: &[Feature],
    stories: &[Story],
    workstream: Option<&str>,
) -> PiSummary {
    let features: Vec<&Feature> = features
        .iter()
        .filter(|f| workstream.is_none() || f.workstream.as_deref() == workstream)
        .collect();
    let feature_keys: HashSet<&str> = features.iter().map(|f| f.key.as_str()).collect();
    let stories: Vec<&Story> = stories
        .iter()
        .filter(|s| s.feature_key.as_deref().is_some_and(|k| feature_keys.contains(k)))
        .collect();

    let completed_features = features.iter().filter(|f| f.status.is_done()).count();
    let completed_stories = stories.iter().filter(|s| s.status.is_done()).count();
    let total_points: f64 = stories.iter().map(|s| s.points_or_zero()).sum();
    let completed_points: f64 = stories
        .iter()
        .filter(|s| s.status.is_done())
        .map(|s| s.points_or_zero())
        .sum();

    PiSummary {
        pi_label: pi_label.to_string(),
        workstream: workstream.map(ToString::to_string),
        total_features: features.len(),
        completed_features,
        total_stories: stories.len(),
        completed_stories,
        total_points,
        completed_points,
        feature_completion: Measure::ratio(completed_features as f64, features.len() as f64),
        story_completion: Measure::ratio(completed_stories as f64, stories.len() as f64),
        point_completion: Measure::ratio(completed_points, total_points),
    }
}
