//! Geographic point labels for map rendering.

use std::collections::HashSet;

use viz_common::{Channel, GeoArea};

/// A single point label: display key plus geographic position.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLabel {
    pub key: String,
    pub lon: f64,
    pub lat: f64,
}

/// Deduplicated set of point labels, built per request.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: Vec<GeoLabel>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build labels from a channel catalog and a selected-id set.
    ///
    /// Channels outside the selection are dropped. Remaining channels
    /// are keyed by the first whitespace token of their code; the first
    /// channel seen for each distinct key wins, later ones are ignored.
    pub fn from_catalog(catalog: &[Channel], selected: &HashSet<i64>) -> Self {
        let mut used = HashSet::new();
        let mut labels = Vec::new();

        for channel in catalog {
            if !selected.contains(&channel.id) {
                continue;
            }
            let key = channel.display_key();
            if used.contains(key) {
                continue;
            }
            used.insert(key.to_string());
            labels.push(GeoLabel {
                key: key.to_string(),
                lon: channel.lon,
                lat: channel.lat,
            });
        }

        Self { labels }
    }

    /// Labels falling inside the given area.
    pub fn subset(&self, area: &GeoArea) -> Self {
        Self {
            labels: self
                .labels
                .iter()
                .filter(|l| area.contains(l.lon, l.lat))
                .cloned()
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeoLabel> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Channel> {
        vec![
            Channel::parse("1:AAA 1:10:20").unwrap(),
            Channel::parse("2:AAA 2:11:21").unwrap(),
            Channel::parse("3:BBB:12:22").unwrap(),
        ]
    }

    #[test]
    fn test_dedup_by_first_token_first_wins() {
        let selected: HashSet<i64> = [1, 2, 3].into_iter().collect();
        let labels = LabelSet::from_catalog(&catalog(), &selected);

        assert_eq!(labels.len(), 2);
        let aaa = labels.iter().find(|l| l.key == "AAA").unwrap();
        // id 1 won, not id 2
        assert_eq!((aaa.lon, aaa.lat), (10.0, 20.0));
        assert!(labels.iter().any(|l| l.key == "BBB"));
    }

    #[test]
    fn test_unselected_channels_dropped() {
        let selected: HashSet<i64> = [3].into_iter().collect();
        let labels = LabelSet::from_catalog(&catalog(), &selected);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.iter().next().unwrap().key, "BBB");
    }

    #[test]
    fn test_empty_selection_yields_no_labels() {
        let labels = LabelSet::from_catalog(&catalog(), &HashSet::new());
        assert!(labels.is_empty());
    }

    #[test]
    fn test_subset_filters_by_area() {
        let selected: HashSet<i64> = [1, 3].into_iter().collect();
        let labels = LabelSet::from_catalog(&catalog(), &selected);
        let area = GeoArea::new(9.0, 10.5, 19.0, 21.0).unwrap();
        let inside = labels.subset(&area);
        assert_eq!(inside.len(), 1);
        assert_eq!(inside.iter().next().unwrap().key, "AAA");
    }
}
