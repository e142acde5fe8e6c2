//! Disruption definitions: the kinds of event that can strike an ecosystem.
//!
//! A [`DisruptionEvent`] is an immutable template: a firing probability,
//! multiplicative impacts on named resources, and optional recovery delays.
//! Events are only ever produced through validation, either by
//! [`EventDefinition::build`] or by deserialising one, so a bad
//! probability or factor is rejected before any cycle runs.
//!
//! ```
//! use cataclysm_logic::disruption::{Catalog, EventDefinition};
//!
//! let flood = EventDefinition::new("Flood", 0.04)
//!     .impact("population", 0.9)
//!     .impact("infrastructure", 0.6)
//!     .recovery("infrastructure", 12)
//!     .build()
//!     .unwrap();
//! let catalog = Catalog::new(vec![flood]).unwrap();
//! assert_eq!(catalog.len(), 1);
//! ```

use std::collections::HashSet;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::constants::resources::{FAUNA, INFRASTRUCTURE, POPULATION, TEMPERATURE, VEGETATION};
use crate::error::CatalogError;

/// Resource-keyed effects in declaration order. Effects are applied and
/// reported in this order. Re-declaring a resource replaces its value in
/// place.
pub type Effects<V> = Vec<(String, V)>;

fn upsert<V>(effects: &mut Effects<V>, resource: String, value: V) {
    match effects.iter_mut().find(|(r, _)| *r == resource) {
        Some(slot) => slot.1 = value,
        None => effects.push((resource, value)),
    }
}

/// (De)serializes [`Effects`] as a JSON object, keeping key order.
mod ordered_effects {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{upsert, Effects};

    pub fn serialize<S, V>(effects: &Effects<V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_map(effects.iter().map(|(r, v)| (r, v)))
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Effects<V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct EffectsVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EffectsVisitor<V> {
            type Value = Effects<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of resource names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut effects = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((resource, value)) = map.next_entry::<String, V>()? {
                    upsert(&mut effects, resource, value);
                }
                Ok(effects)
            }
        }

        deserializer.deserialize_map(EffectsVisitor(PhantomData))
    }
}

/// Unvalidated description of a disruption event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    pub probability: f64,
    #[serde(default, with = "ordered_effects")]
    pub impact: Effects<f64>,
    #[serde(default, with = "ordered_effects")]
    pub recovery_delay: Effects<u32>,
}

impl EventDefinition {
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            impact: Vec::new(),
            recovery_delay: Vec::new(),
        }
    }

    /// Multiply `resource` by `factor` when the event fires.
    pub fn impact(mut self, resource: impl Into<String>, factor: f64) -> Self {
        upsert(&mut self.impact, resource.into(), factor);
        self
    }

    /// Restore `resource` `cycles` cycles after the event fires.
    pub fn recovery(mut self, resource: impl Into<String>, cycles: u32) -> Self {
        upsert(&mut self.recovery_delay, resource.into(), cycles);
        self
    }

    /// Validate and freeze the definition.
    pub fn build(self) -> Result<DisruptionEvent, CatalogError> {
        DisruptionEvent::try_from(self)
    }
}

/// A validated, immutable disruption event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventDefinition")]
pub struct DisruptionEvent {
    name: String,
    probability: f64,
    #[serde(serialize_with = "ordered_effects::serialize")]
    impact: Effects<f64>,
    #[serde(serialize_with = "ordered_effects::serialize")]
    recovery_delay: Effects<NonZeroU32>,
}

impl TryFrom<EventDefinition> for DisruptionEvent {
    type Error = CatalogError;

    fn try_from(def: EventDefinition) -> Result<Self, Self::Error> {
        if def.name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if !(0.0..=1.0).contains(&def.probability) {
            return Err(CatalogError::ProbabilityOutOfRange {
                event: def.name,
                value: def.probability,
            });
        }
        if let Some((resource, factor)) = def
            .impact
            .iter()
            .find(|(_, f)| !(0.0..=1.0).contains(f))
        {
            return Err(CatalogError::ImpactOutOfRange {
                event: def.name.clone(),
                resource: resource.clone(),
                factor: *factor,
            });
        }

        let mut recovery_delay = Vec::with_capacity(def.recovery_delay.len());
        for (resource, cycles) in def.recovery_delay {
            match NonZeroU32::new(cycles) {
                Some(delay) => recovery_delay.push((resource, delay)),
                None => {
                    return Err(CatalogError::ZeroRecoveryDelay {
                        event: def.name,
                        resource,
                    })
                }
            }
        }

        Ok(Self {
            name: def.name,
            probability: def.probability,
            impact: def.impact,
            recovery_delay,
        })
    }
}

impl DisruptionEvent {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-cycle chance of firing, in [0.0, 1.0].
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Resource → multiplicative factor, in declaration order.
    pub fn impacts(&self) -> impl Iterator<Item = (&str, f64)> {
        self.impact.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Resource → cycles until restoration, in declaration order.
    pub fn recovery_delays(&self) -> impl Iterator<Item = (&str, NonZeroU32)> {
        self.recovery_delay.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Whether `resource` is impacted with no recovery ever scheduled.
    pub fn degrades_permanently(&self, resource: &str) -> bool {
        self.impact.iter().any(|(r, _)| r == resource)
            && !self.recovery_delay.iter().any(|(r, _)| r == resource)
    }
}

// ============================================================================
// BUILT-IN KINDS
// ============================================================================

/// The closed set of built-in natural disasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisruptionKind {
    VolcanicEruption,
    Earthquake,
    Storm,
    Wildfire,
}

impl DisruptionKind {
    /// Built-in kinds in catalog order.
    pub fn all() -> &'static [DisruptionKind] {
        &[
            Self::VolcanicEruption,
            Self::Earthquake,
            Self::Storm,
            Self::Wildfire,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::VolcanicEruption => "Volcanic Eruption",
            Self::Earthquake => "Earthquake",
            Self::Storm => "Storm",
            Self::Wildfire => "Wildfire",
        }
    }

    pub fn definition(self) -> EventDefinition {
        let def = EventDefinition::new(self.name(), self.probability());
        match self {
            Self::VolcanicEruption => def
                .impact(VEGETATION, 0.2)
                .impact(FAUNA, 0.5)
                .impact(POPULATION, 0.7)
                .impact(TEMPERATURE, 0.9)
                .recovery(TEMPERATURE, 5)
                .recovery(VEGETATION, 10),
            Self::Earthquake => def
                .impact(POPULATION, 0.8)
                .impact(FAUNA, 0.9)
                .impact(INFRASTRUCTURE, 0.5)
                .recovery(INFRASTRUCTURE, 15),
            Self::Storm => def
                .impact(VEGETATION, 0.7)
                .impact(FAUNA, 0.85)
                .impact(POPULATION, 0.95)
                .recovery(VEGETATION, 5),
            Self::Wildfire => def
                .impact(VEGETATION, 0.3)
                .impact(FAUNA, 0.6)
                .recovery(VEGETATION, 8),
        }
    }

    fn probability(self) -> f64 {
        match self {
            Self::VolcanicEruption => 0.01,
            Self::Earthquake => 0.02,
            Self::Storm => 0.05,
            Self::Wildfire => 0.03,
        }
    }

    /// The validated event for this kind. Built-in definitions never carry
    /// a zero delay.
    pub fn event(self) -> DisruptionEvent {
        let def = self.definition();
        DisruptionEvent {
            name: def.name,
            probability: def.probability,
            impact: def.impact,
            recovery_delay: def
                .recovery_delay
                .into_iter()
                .filter_map(|(r, c)| NonZeroU32::new(c).map(|d| (r, d)))
                .collect(),
        }
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// Ordered, fixed collection of disruption events evaluated every cycle.
///
/// Event names are unique. Order is significant: it is the order in which
/// draws are taken and impacts compound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DisruptionEvent>", into = "Vec<DisruptionEvent>")]
pub struct Catalog {
    events: Vec<DisruptionEvent>,
}

impl Catalog {
    pub fn new(events: Vec<DisruptionEvent>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for event in &events {
            if !seen.insert(event.name.as_str()) {
                return Err(CatalogError::DuplicateEvent {
                    name: event.name.clone(),
                });
            }
        }
        Ok(Self { events })
    }

    /// Catalog of every built-in [`DisruptionKind`], in declaration order.
    pub fn standard() -> Self {
        Self {
            events: DisruptionKind::all().iter().map(|k| k.event()).collect(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DisruptionEvent> {
        self.events.iter()
    }

    pub fn get(&self, name: &str) -> Option<&DisruptionEvent> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<DisruptionEvent>> for Catalog {
    type Error = CatalogError;

    fn try_from(events: Vec<DisruptionEvent>) -> Result<Self, Self::Error> {
        Self::new(events)
    }
}

impl From<Catalog> for Vec<DisruptionEvent> {
    fn from(catalog: Catalog) -> Self {
        catalog.events
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a DisruptionEvent;
    type IntoIter = std::slice::Iter<'a, DisruptionEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_builtin_kinds_pass_validation() {
        for kind in DisruptionKind::all() {
            let built = kind.definition().build().expect("built-in must validate");
            assert_eq!(built, kind.event(), "{:?}", kind);
        }
    }

    #[test]
    fn test_standard_catalog_order() {
        let names: Vec<_> = Catalog::standard().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["Volcanic Eruption", "Earthquake", "Storm", "Wildfire"]
        );
    }

    #[test]
    fn test_volcanic_eruption_values() {
        let event = DisruptionKind::VolcanicEruption.event();
        assert_eq!(event.probability(), 0.01);
        let impacts: BTreeMap<_, _> = event.impacts().collect();
        assert_eq!(impacts["vegetation"], 0.2);
        assert_eq!(impacts["temperature"], 0.9);
        let delays: BTreeMap<_, _> = event.recovery_delays().map(|(r, d)| (r, d.get())).collect();
        assert_eq!(delays["temperature"], 5);
        assert_eq!(delays["vegetation"], 10);
        assert!(event.degrades_permanently("fauna"));
        assert!(!event.degrades_permanently("vegetation"));
    }

    #[test]
    fn test_effects_keep_declaration_order() {
        let event = DisruptionKind::VolcanicEruption.event();
        let impacted: Vec<_> = event.impacts().map(|(r, _)| r).collect();
        assert_eq!(impacted, vec!["vegetation", "fauna", "population", "temperature"]);
        let recovering: Vec<_> = event.recovery_delays().map(|(r, _)| r).collect();
        assert_eq!(recovering, vec!["temperature", "vegetation"]);
    }

    #[test]
    fn test_redeclared_effect_replaces_in_place() {
        let event = EventDefinition::new("Hail", 0.1)
            .impact("vegetation", 0.5)
            .impact("fauna", 0.9)
            .impact("vegetation", 0.8)
            .build()
            .unwrap();
        let impacts: Vec<_> = event.impacts().collect();
        assert_eq!(impacts, vec![("vegetation", 0.8), ("fauna", 0.9)]);
    }

    #[test]
    fn test_json_key_order_survives_round_trip() {
        let json = r#"{"name": "Flood", "probability": 0.04,
            "impact": {"population": 0.9, "infrastructure": 0.6, "fauna": 0.95},
            "recovery_delay": {"infrastructure": 12}}"#;
        let event: DisruptionEvent = serde_json::from_str(json).unwrap();
        let impacted: Vec<_> = event.impacts().map(|(r, _)| r).collect();
        assert_eq!(impacted, vec!["population", "infrastructure", "fauna"]);

        let out = serde_json::to_string(&event).unwrap();
        let population = out.find("population").unwrap();
        let fauna = out.find("fauna").unwrap();
        assert!(population < fauna, "{out}");
        let reloaded: DisruptionEvent = serde_json::from_str(&out).unwrap();
        assert_eq!(reloaded, event);
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = EventDefinition::new("  ", 0.5).build().unwrap_err();
        assert_eq!(err, CatalogError::EmptyName);
    }

    #[test]
    fn test_rejects_bad_probability() {
        for p in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
            let err = EventDefinition::new("Drought", p).build().unwrap_err();
            assert!(matches!(err, CatalogError::ProbabilityOutOfRange { .. }), "{p}");
        }
        assert!(EventDefinition::new("Drought", 0.0).build().is_ok());
        assert!(EventDefinition::new("Drought", 1.0).build().is_ok());
    }

    #[test]
    fn test_rejects_bad_impact() {
        let err = EventDefinition::new("Drought", 0.1)
            .impact("vegetation", 1.2)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::ImpactOutOfRange {
                event: "Drought".into(),
                resource: "vegetation".into(),
                factor: 1.2,
            }
        );
        assert!(EventDefinition::new("Drought", 0.1)
            .impact("vegetation", -0.5)
            .build()
            .is_err());
    }

    #[test]
    fn test_rejects_zero_delay() {
        let err = EventDefinition::new("Drought", 0.1)
            .impact("vegetation", 0.5)
            .recovery("vegetation", 0)
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::ZeroRecoveryDelay { .. }));
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let a = DisruptionKind::Storm.event();
        let err = Catalog::new(vec![a.clone(), a]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateEvent {
                name: "Storm".into()
            }
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"[{"name": "Flood", "probability": 2.0}]"#;
        assert!(serde_json::from_str::<Catalog>(json).is_err());

        let json = r#"[{"name": "Flood", "probability": 0.5, "impact": {"fauna": 0.5}}]"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        assert!(catalog.get("Flood").unwrap().degrades_permanently("fauna"));
    }

    #[test]
    fn test_serialized_catalog_reloads() {
        let json = serde_json::to_string(&Catalog::standard()).unwrap();
        let reloaded: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, Catalog::standard());
    }
}
