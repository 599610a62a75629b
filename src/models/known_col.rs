// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Well-known cols used for name autocomplete.

use serde::Serialize;

/// Queries shorter than this return no suggestions.
const MIN_QUERY_CHARS: usize = 2;

/// A famous climb with reference coordinates and profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KnownCol {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    /// Kilometers
    pub distance: f64,
    /// Meters
    pub elevation: u32,
}

pub const KNOWN_COLS: &[KnownCol] = &[
    KnownCol { name: "Col du Tourmalet", lat: 42.9083, lng: 0.1214, distance: 18.6, elevation: 1404 },
    KnownCol { name: "Col du Galibier", lat: 45.0642, lng: 6.4086, distance: 35.1, elevation: 2121 },
    KnownCol { name: "Alpe d'Huez", lat: 45.0911, lng: 6.0683, distance: 13.8, elevation: 1125 },
    KnownCol { name: "Mont Ventoux", lat: 44.1745, lng: 5.2742, distance: 21.8, elevation: 1617 },
    KnownCol { name: "Col de l'Iseran", lat: 45.4172, lng: 7.0311, distance: 48.0, elevation: 1955 },
    KnownCol { name: "Col d'Izoard", lat: 44.8206, lng: 6.735, distance: 19.2, elevation: 1141 },
    KnownCol { name: "Col de la Madeleine", lat: 45.435, lng: 6.405, distance: 25.3, elevation: 1585 },
];

/// Case-insensitive substring match over the catalogue.
pub fn suggest(query: &str) -> Vec<KnownCol> {
    let query = query.trim().to_lowercase();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }

    KNOWN_COLS
        .iter()
        .filter(|col| col.name.to_lowercase().contains(&query))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_matches_case_insensitively() {
        let names: Vec<_> = suggest("COL DU").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Col du Tourmalet", "Col du Galibier"]);
    }

    #[test]
    fn test_suggest_requires_two_chars() {
        assert!(suggest("c").is_empty());
        assert!(suggest(" ").is_empty());
        assert_eq!(suggest("ve").len(), 1);
    }
}
