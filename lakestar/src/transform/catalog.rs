//! Derivation of the `items` and `publishers` dimensions from catalog records.

use std::collections::HashSet;

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::{debug, warn};

use crate::source::{Field, SourceRecord, SourceTable};
use crate::types::{ItemRecord, PublisherRecord};

/// Dimensions derived from the catalog plus the rows that could not contribute.
#[derive(Debug, Clone, Default)]
pub struct CatalogOutput {
    /// Items in first-seen order, unique by `item_id`.
    pub items: Vec<ItemRecord>,
    /// Publishers in first-seen order, unique by `name`.
    pub publishers: Vec<PublisherRecord>,
    /// Catalog rows without an `item_id`.
    pub rows_without_item_id: u64,
    /// Catalog rows repeating an already seen `item_id`.
    pub duplicate_items: u64,
    /// Publishers whose upstream id was already taken by another name.
    pub reassigned_publisher_ids: u64,
}

/// Builds the item and publisher dimensions.
///
/// Publishers are deduplicated by name, the first occurrence providing the attributes. Items
/// take the `publisher_id` of their publisher's deduplicated record, so every non-null
/// `items.publisher_id` exists in `publishers`.
///
/// `publisher_id` stays unique: a name whose upstream id already belongs to another name is
/// keyed by the name instead, see [`claim_publisher_id`].
pub fn transform_catalog(catalog: &SourceTable) -> CatalogOutput {
    let mut output = CatalogOutput::default();
    let mut publishers: IndexMap<String, PublisherRecord> = IndexMap::new();
    let mut claimed_ids: HashSet<String> = HashSet::new();
    for record in &catalog.records {
        let Some(name) = publisher_name(record) else {
            continue;
        };

        if let Entry::Vacant(entry) = publishers.entry(name) {
            let upstream_id = record
                .text(Field::PublisherId)
                .filter(|id| !id.trim().is_empty());
            if upstream_id.as_ref().is_some_and(|id| claimed_ids.contains(id)) {
                debug!(
                    name = %entry.key(),
                    publisher_id = upstream_id.as_deref().unwrap_or_default(),
                    "publisher id already taken by another name"
                );
                output.reassigned_publisher_ids += 1;
            }
            let publisher_id = claim_publisher_id(upstream_id, entry.key(), &mut claimed_ids);

            let publisher = PublisherRecord {
                publisher_id,
                name: entry.key().clone(),
                location: record.text(Field::PublisherLocation),
                latitude: record.f64(Field::Latitude),
                longitude: record.f64(Field::Longitude),
            };
            entry.insert(publisher);
        }
    }

    let mut items: IndexMap<String, ItemRecord> = IndexMap::new();
    for record in &catalog.records {
        let Some(item_id) = record
            .text(Field::ItemId)
            .filter(|id| !id.trim().is_empty())
        else {
            output.rows_without_item_id += 1;
            continue;
        };

        match items.entry(item_id) {
            Entry::Occupied(entry) => {
                debug!(item_id = %entry.key(), "ignoring duplicate catalog item");
                output.duplicate_items += 1;
            }
            Entry::Vacant(entry) => {
                let publisher_id = publisher_name(record)
                    .and_then(|name| publishers.get(&name))
                    .map(|publisher| publisher.publisher_id.clone());

                let item = ItemRecord {
                    item_id: entry.key().clone(),
                    publisher_id,
                    title: record.text(Field::Title),
                    duration_seconds: record.f64(Field::Duration),
                    release_year: record.i32(Field::Year),
                };
                entry.insert(item);
            }
        }
    }

    if output.rows_without_item_id > 0 {
        warn!(
            rows = output.rows_without_item_id,
            "dropped catalog rows without an item id"
        );
    }

    if output.reassigned_publisher_ids > 0 {
        warn!(
            publishers = output.reassigned_publisher_ids,
            "keyed publishers by name because their upstream id was shared"
        );
    }

    output.items = items.into_values().collect();
    output.publishers = publishers.into_values().collect();

    output
}

/// Picks the first free id among the upstream id, the name and `<name>~2`, `<name>~3`, ...
fn claim_publisher_id(
    upstream_id: Option<String>,
    name: &str,
    claimed_ids: &mut HashSet<String>,
) -> String {
    let base = match upstream_id {
        Some(id) if !claimed_ids.contains(&id) => id,
        _ => name.to_string(),
    };

    let mut publisher_id = base.clone();
    let mut suffix = 2;
    while claimed_ids.contains(&publisher_id) {
        publisher_id = format!("{base}~{suffix}");
        suffix += 1;
    }

    claimed_ids.insert(publisher_id.clone());
    publisher_id
}

fn publisher_name(record: &SourceRecord) -> Option<String> {
    record
        .text(Field::PublisherName)
        .filter(|name| !name.trim().is_empty())
}
