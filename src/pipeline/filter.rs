//! Wildlife filtering of raw detections.

use crate::config::WildlifeConfig;
use crate::constants::PERSON_CLASS;
use crate::inference::{RawDetection, Vocabulary};
use crate::output::AcceptedDetection;
use std::collections::BTreeSet;
use tracing::warn;

/// Labels considered wildlife.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    /// Every label is eligible.
    Any,
    /// Only these labels (lower-cased) are eligible.
    Only(BTreeSet<String>),
}

impl AllowList {
    /// Build an allow-list from labels. Matching is case-insensitive.
    pub fn only<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Only(labels.into_iter().map(|l| normalize_label(l.as_ref())).collect())
    }

    /// Whether a label passes.
    pub fn allows(&self, label: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(labels) => labels.contains(&normalize_label(label)),
        }
    }
}

/// Build the effective allow-list for a detector.
///
/// A species list replaces the configured wildlife classes. Detectors without
/// a fixed vocabulary get [`AllowList::Any`], since their labels cannot be
/// known in advance.
pub fn build_allow_list(
    vocabulary: Option<&Vocabulary>,
    wildlife: &WildlifeConfig,
    species_list: Option<Vec<String>>,
) -> AllowList {
    let Some(vocabulary) = vocabulary else {
        return AllowList::Any;
    };

    let mut labels = species_list.unwrap_or_else(|| wildlife.classes.clone());
    if wildlife.include_people {
        labels.push(PERSON_CLASS.to_string());
    }

    let known: BTreeSet<String> = vocabulary.iter().map(|l| normalize_label(l)).collect();
    for label in &labels {
        if !known.contains(&normalize_label(label)) {
            warn!("Wildlife class '{label}' is not in the detector vocabulary");
        }
    }

    AllowList::only(labels)
}

/// Keep detections at or above `threshold` whose label is allowed.
///
/// Input order is preserved and overlapping boxes are not merged.
pub fn filter_detections(
    raw: &[RawDetection],
    threshold: f32,
    allow: &AllowList,
) -> Vec<AcceptedDetection> {
    raw.iter()
        .filter(|d| d.confidence >= threshold && allow.allows(&d.label))
        .map(|d| AcceptedDetection {
            animal: d.label.clone(),
            confidence: d.confidence,
            bbox: d.bbox,
        })
        .collect()
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::inference::BoundingBox;

    fn raw(label: &str, confidence: f32) -> RawDetection {
        RawDetection::new(label, confidence, BoundingBox::new(0.0, 0.0, 1.0, 1.0))
    }

    fn sample() -> Vec<RawDetection> {
        vec![
            raw("deer", 0.91),
            raw("car", 0.95),
            raw("Deer", 0.35),
            raw("bear", 0.29),
            raw("person", 0.6),
        ]
    }

    #[test]
    fn test_threshold_and_allow_list() {
        let allow = AllowList::only(["deer", "bear"]);
        let accepted = filter_detections(&sample(), 0.3, &allow);

        let animals: Vec<_> = accepted.iter().map(|d| d.animal.as_str()).collect();
        assert_eq!(animals, vec!["deer", "Deer"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let accepted = filter_detections(&[raw("fox", 0.3)], 0.3, &AllowList::Any);
        assert_eq!(accepted.len(), 1);
    }

    #[test]
    fn test_any_allows_every_label() {
        let accepted = filter_detections(&sample(), 0.0, &AllowList::Any);
        assert_eq!(accepted.len(), 5);
    }

    #[test]
    fn test_higher_threshold_accepts_subset() {
        let detections = sample();
        let allow = AllowList::only(["deer", "bear", "person"]);
        let thresholds = [0.0, 0.29, 0.3, 0.35, 0.5, 0.6, 0.91, 0.95, 1.0];

        for pair in thresholds.windows(2) {
            let low = filter_detections(&detections, pair[0], &allow);
            let high = filter_detections(&detections, pair[1], &allow);
            assert!(high.iter().all(|d| low.contains(d)), "{pair:?}");
        }
    }

    #[test]
    fn test_no_vocabulary_bypasses_allow_list() {
        let allow = build_allow_list(None, &WildlifeConfig::default(), None);
        assert_eq!(allow, AllowList::Any);
    }

    #[test]
    fn test_species_list_replaces_classes() {
        let vocabulary: Vocabulary = ["deer", "person", "dog"].iter().map(ToString::to_string).collect();
        let wildlife = WildlifeConfig {
            classes: vec!["dog".to_string()],
            include_people: false,
        };

        let allow = build_allow_list(Some(&vocabulary), &wildlife, Some(vec!["Deer".to_string()]));
        assert!(allow.allows("deer"));
        assert!(!allow.allows("dog"));
        assert!(!allow.allows("person"));
    }

    #[test]
    fn test_include_people_adds_person() {
        let vocabulary: Vocabulary = ["person", "bear"].iter().map(ToString::to_string).collect();
        let allow = build_allow_list(Some(&vocabulary), &WildlifeConfig::default(), None);
        assert!(allow.allows("person"));
        assert!(allow.allows("bear"));
        assert!(!allow.allows("car"));
    }
}
