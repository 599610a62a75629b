// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! List and map renderers, kept current as cache observers.

use crate::db::EntryStore;
use crate::models::Entry;
use crate::services::entry_cache::EntryCache;
use crate::services::observers::{Snapshot, Subscription};
use chrono::{Datelike, NaiveDate};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::{Arc, PoisonError, RwLock};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Fraction of the marker span added on each side of the map bounds.
const BOUNDS_PADDING: f64 = 0.3;

const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// One line of the cols list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ListRow {
    pub id: String,
    pub name: String,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// Long French form, e.g. "14 juillet 2024"
    pub date_label: Option<String>,
    pub time: Option<String>,
    pub distance: Option<f64>,
    pub elevation: Option<u32>,
    pub avg_gradient_pct: Option<f64>,
}

/// Long French date, as the web client shows it.
pub fn french_long_date(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS_FR[date.month0() as usize],
        date.year()
    )
}

/// Most recent first; undated entries go last in stored order.
fn by_date_desc(a: &Entry, b: &Entry) -> Ordering {
    match (a.data.date, b.data.date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rendered cols list.
#[derive(Default)]
pub struct ListView {
    rows: RwLock<Arc<Vec<ListRow>>>,
}

impl ListView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn render(entries: &[Entry]) -> Vec<ListRow> {
        let mut sorted: Vec<&Entry> = entries.iter().collect();
        sorted.sort_by(|a, b| by_date_desc(a, b));

        sorted
            .into_iter()
            .map(|entry| ListRow {
                id: entry.id.clone(),
                name: entry.data.name.clone(),
                date: entry.data.date.map(|d| d.format("%Y-%m-%d").to_string()),
                date_label: entry.data.date.map(french_long_date),
                time: entry.data.time.clone(),
                distance: entry.data.distance,
                elevation: entry.data.elevation,
                avg_gradient_pct: entry.data.avg_gradient_pct(),
            })
            .collect()
    }

    pub fn rows(&self) -> Arc<Vec<ListRow>> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, snapshot: &Snapshot) {
        let rows = Arc::new(Self::render(snapshot));
        *self.rows.write().unwrap_or_else(PoisonError::into_inner) = rows;
    }

    /// Re-render on every snapshot change of `cache`.
    pub fn attach<S: EntryStore>(self: &Arc<Self>, cache: &EntryCache<S>) -> Subscription {
        let view = Arc::clone(self);
        cache.subscribe(move |snapshot| {
            view.update(snapshot);
            Ok(())
        })
    }
}

/// Rendered map markers as GeoJSON.
pub struct MapView {
    markers: RwLock<Arc<FeatureCollection>>,
}

impl MapView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            markers: RwLock::new(Arc::new(Self::render(&[]))),
        })
    }

    /// Point features `[lng, lat]` with popup text and padded bounds.
    pub fn render(entries: &[Entry]) -> FeatureCollection {
        let features = entries.iter().map(marker).collect();

        FeatureCollection {
            bbox: padded_bounds(entries),
            features,
            foreign_members: None,
        }
    }

    pub fn markers(&self) -> Arc<FeatureCollection> {
        self.markers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True when there is nothing to put on the map.
    pub fn is_empty(&self) -> bool {
        self.markers().features.is_empty()
    }

    fn update(&self, snapshot: &Snapshot) {
        let markers = Arc::new(Self::render(snapshot));
        *self.markers.write().unwrap_or_else(PoisonError::into_inner) = markers;
    }

    /// Re-render on every snapshot change of `cache`.
    pub fn attach<S: EntryStore>(self: &Arc<Self>, cache: &EntryCache<S>) -> Subscription {
        let view = Arc::clone(self);
        cache.subscribe(move |snapshot| {
            view.update(snapshot);
            Ok(())
        })
    }
}

fn popup_text(entry: &Entry) -> String {
    let distance = entry
        .data
        .distance
        .map(|d| d.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!("{}\n{} km", entry.data.name, distance)
}

fn marker(entry: &Entry) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), entry.data.name.clone().into());
    properties.insert("distance".to_string(), entry.data.distance.into());
    properties.insert("elevation".to_string(), entry.data.elevation.into());
    properties.insert("popup".to_string(), popup_text(entry).into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            entry.data.lng,
            entry.data.lat,
        ]))),
        id: Some(Id::String(entry.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// `[west, south, east, north]`, grown by [`BOUNDS_PADDING`] of the span per side.
fn padded_bounds(entries: &[Entry]) -> Option<Vec<f64>> {
    let first = entries.first()?;
    let (mut west, mut south) = (first.data.lng, first.data.lat);
    let (mut east, mut north) = (west, south);

    for entry in &entries[1..] {
        west = west.min(entry.data.lng);
        east = east.max(entry.data.lng);
        south = south.min(entry.data.lat);
        north = north.max(entry.data.lat);
    }

    let pad_lng = (east - west) * BOUNDS_PADDING;
    let pad_lat = (north - south) * BOUNDS_PADDING;
    Some(vec![
        west - pad_lng,
        south - pad_lat,
        east + pad_lng,
        north + pad_lat,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryData;

    fn entry(id: &str, date: Option<&str>, lat: f64, lng: f64) -> Entry {
        Entry {
            id: id.to_string(),
            data: EntryData {
                name: format!("Col {id}"),
                time: None,
                distance: Some(10.0),
                elevation: Some(500),
                date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
                lat,
                lng,
                created_at: None,
            },
        }
    }

    #[test]
    fn test_list_sorted_newest_first_undated_last() {
        let entries = vec![
            entry("a", None, 0.0, 0.0),
            entry("b", Some("2023-06-01"), 0.0, 0.0),
            entry("c", Some("2024-07-14"), 0.0, 0.0),
            entry("d", None, 0.0, 0.0),
        ];
        let ids: Vec<_> = ListView::render(&entries)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_list_row_fields() {
        let rows = ListView::render(&[entry("a", Some("2024-07-01"), 0.0, 0.0)]);
        assert_eq!(rows[0].date_label.as_deref(), Some("1 juillet 2024"));
        assert_eq!(rows[0].avg_gradient_pct, Some(5.0));
    }

    #[test]
    fn test_map_markers_and_bounds() {
        let entries = vec![entry("a", None, 45.0, 6.0), entry("b", None, 46.0, 8.0)];
        let map = MapView::render(&entries);

        assert_eq!(map.features.len(), 2);
        let first = &map.features[0];
        assert_eq!(first.id, Some(Id::String("a".to_string())));
        assert_eq!(
            first.geometry.as_ref().map(|g| &g.value),
            Some(&Value::Point(vec![6.0, 45.0]))
        );
        assert_eq!(
            first.property("popup").and_then(|v| v.as_str()),
            Some("Col a\n10 km")
        );

        let bbox = map.bbox.unwrap();
        let expected = [5.4, 44.7, 8.6, 46.3];
        for (got, want) in bbox.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
    }

    #[test]
    fn test_map_empty_snapshot() {
        let map = MapView::render(&[]);
        assert!(map.features.is_empty());
        assert!(map.bbox.is_none());
    }

    #[test]
    fn test_popup_without_distance() {
        let mut e = entry("a", None, 0.0, 0.0);
        e.data.distance = None;
        assert_eq!(popup_text(&e), "Col a\n? km");
    }
}
