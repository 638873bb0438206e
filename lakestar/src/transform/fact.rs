//! Assembly of the `events` fact table.

use std::collections::HashMap;

use lakestar_config::shared::TextMatchMode;
use metrics::counter;
use tracing::{debug, info, warn};

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::metrics::{JOIN_LABEL, LAKESTAR_JOIN_AMBIGUOUS_TOTAL, LAKESTAR_JOIN_UNMATCHED_TOTAL};
use crate::transform::keys::assign_surrogate_keys;
use crate::transform::log::PlayRow;
use crate::transform::matching::{MatchOutcome, TextMatcher};
use crate::types::{ActorRecord, EventRecord, ItemRecord, PublisherRecord, TimeRecord};

/// Name of the publisher join in metrics and logs.
pub const PUBLISHER_JOIN: &str = "publisher";
/// Name of the actor join in metrics and logs.
pub const ACTOR_JOIN: &str = "actor";
/// Name of the item join in metrics and logs.
pub const ITEM_JOIN: &str = "item";

/// The dimensions the fact table joins against.
#[derive(Debug, Clone, Copy)]
pub struct Dimensions<'a> {
    pub items: &'a [ItemRecord],
    pub publishers: &'a [PublisherRecord],
    pub actors: &'a [ActorRecord],
    pub times: &'a [TimeRecord],
}

/// Per-join mismatch counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinCounts {
    /// Plays dropped because no publisher matched.
    pub publisher_unmatched: u64,
    /// Plays whose publisher matched several candidates.
    pub publisher_ambiguous: u64,
    /// Plays dropped because their actor is missing.
    pub actor_unmatched: u64,
    /// Events with a null `item_id`.
    pub item_unmatched: u64,
    /// Events whose item matched several candidates.
    pub item_ambiguous: u64,
}

/// Output of [`FactAssembler::assemble`].
#[derive(Debug, Clone, Default)]
pub struct FactOutput {
    pub events: Vec<EventRecord>,
    pub joins: JoinCounts,
}

/// Joins clean plays against the dimensions.
///
/// Publishers are an inner join on a text match of the log's artist, actors an inner hash join
/// on `actor_id`, items a left join on a text match of the log's song. Time columns come from
/// the [`TimeRecord`] of the play's second.
#[derive(Debug, Clone, Copy)]
pub struct FactAssembler {
    publisher_match: TextMatchMode,
    item_match: TextMatchMode,
}

impl FactAssembler {
    pub fn new(publisher_match: TextMatchMode, item_match: TextMatchMode) -> Self {
        Self {
            publisher_match,
            item_match,
        }
    }

    /// Builds the events of `plays`.
    ///
    /// Plays are ordered by timestamp, `actor_id`, `session_id` and source position before
    /// `songplay_id` is assigned, so keys are stable for identical input.
    ///
    /// Fails with [`ErrorKind::InvalidState`] if a play has no time row, which means the plays
    /// and the time dimension were not derived from the same logs.
    pub fn assemble(
        &self,
        plays: &[PlayRow],
        dimensions: Dimensions<'_>,
    ) -> EtlResult<FactOutput> {
        let publishers = TextMatcher::new(
            self.publisher_match,
            dimensions
                .publishers
                .iter()
                .map(|publisher| Some(publisher.name.as_str())),
        );
        let items = TextMatcher::new(
            self.item_match,
            dimensions.items.iter().map(|item| item.title.as_deref()),
        );
        let actors: HashMap<&str, &ActorRecord> = dimensions
            .actors
            .iter()
            .map(|actor| (actor.actor_id.as_str(), actor))
            .collect();
        let times: HashMap<i64, &TimeRecord> = dimensions
            .times
            .iter()
            .map(|time| (time.epoch_seconds, time))
            .collect();

        let mut ordered: Vec<&PlayRow> = plays.iter().collect();
        ordered.sort_by(|a, b| {
            a.ts_millis
                .cmp(&b.ts_millis)
                .then_with(|| a.actor_id.cmp(&b.actor_id))
                .then_with(|| a.session_id.cmp(&b.session_id))
                .then_with(|| a.source_index.cmp(&b.source_index))
        });

        let mut joins = JoinCounts::default();
        let mut joined = Vec::with_capacity(ordered.len());
        for play in ordered {
            let outcome = publishers.find(play.artist.as_deref().unwrap_or_default());
            if outcome.is_ambiguous() {
                joins.publisher_ambiguous += 1;
                log_ambiguous(PUBLISHER_JOIN, play.artist.as_deref(), outcome);
            }
            let Some(publisher) = outcome
                .index()
                .map(|index| &dimensions.publishers[index])
            else {
                joins.publisher_unmatched += 1;
                continue;
            };

            let Some(actor) = actors.get(play.actor_id.as_str()) else {
                joins.actor_unmatched += 1;
                continue;
            };

            let outcome = items.find(play.song.as_deref().unwrap_or_default());
            if outcome.is_ambiguous() {
                joins.item_ambiguous += 1;
                log_ambiguous(ITEM_JOIN, play.song.as_deref(), outcome);
            }
            let item = outcome.index().map(|index| &dimensions.items[index]);
            if item.is_none() {
                joins.item_unmatched += 1;
            }

            let Some(time) = times.get(&play.epoch_seconds()) else {
                bail!(
                    ErrorKind::InvalidState,
                    "Play has no matching time row",
                    format!("actor {} at {}", play.actor_id, play.timestamp)
                );
            };

            joined.push((play, publisher, *actor, item, *time));
        }

        let events = assign_surrogate_keys(joined)
            .map(|(songplay_id, (play, publisher, actor, item, time))| EventRecord {
                songplay_id,
                publisher_id: publisher.publisher_id.clone(),
                actor_id: actor.actor_id.clone(),
                subscription_level: play.subscription_level.clone(),
                item_id: item.map(|item| item.item_id.clone()),
                start_time: time.start_time.clone(),
                location: play.location.clone(),
                session_id: play.session_id,
                user_agent: play.user_agent.clone(),
                item_title: play.song.clone(),
                year: time.year,
                month: time.month,
            })
            .collect::<Vec<_>>();

        record_join_counts(&joins);
        info!(
            events = events.len(),
            publisher_match = self.publisher_match.as_str(),
            item_match = self.item_match.as_str(),
            publisher_unmatched = joins.publisher_unmatched,
            actor_unmatched = joins.actor_unmatched,
            item_unmatched = joins.item_unmatched,
            "assembled events"
        );

        Ok(FactOutput { events, joins })
    }
}

fn log_ambiguous(join: &'static str, probe: Option<&str>, outcome: MatchOutcome) {
    if let MatchOutcome::Ambiguous { index, candidates } = outcome {
        debug!(
            join,
            probe = probe.unwrap_or_default(),
            chosen = index,
            candidates,
            "ambiguous text match, keeping the first candidate"
        );
    }
}

fn record_join_counts(joins: &JoinCounts) {
    let unmatched = [
        (PUBLISHER_JOIN, joins.publisher_unmatched),
        (ACTOR_JOIN, joins.actor_unmatched),
        (ITEM_JOIN, joins.item_unmatched),
    ];
    for (join, count) in unmatched {
        if count > 0 {
            counter!(LAKESTAR_JOIN_UNMATCHED_TOTAL, JOIN_LABEL => join).increment(count);
        }
    }

    let ambiguous = [
        (PUBLISHER_JOIN, joins.publisher_ambiguous),
        (ITEM_JOIN, joins.item_ambiguous),
    ];
    for (join, count) in ambiguous {
        if count > 0 {
            counter!(LAKESTAR_JOIN_AMBIGUOUS_TOTAL, JOIN_LABEL => join).increment(count);
        }
    }

    if joins.publisher_ambiguous > 0 || joins.item_ambiguous > 0 {
        warn!(
            publisher = joins.publisher_ambiguous,
            item = joins.item_ambiguous,
            "text joins matched several candidates"
        );
    }
}
