use indexmap::IndexMap;
use std::time::{Duration, Instant};

pub type RegionId = String;
pub type CountryCode = String;

/// A commerce region as listed by the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub id: RegionId,
    pub countries: Vec<CountryCode>,
}

impl Region {
    pub fn new<I, C, S>(id: I, countries: C) -> Self
    where
        I: Into<String>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Region {
            id: id.into(),
            countries: countries.into_iter().map(Into::into).collect(),
        }
    }
}

/// Immutable country code to region id mapping.
///
/// Snapshots are never mutated after construction. A refresh builds a new one and swaps it in,
/// so readers keep a consistent view for the whole request.
#[derive(Clone, Debug, Default)]
pub struct DirectorySnapshot {
    // Insertion order follows the catalog (region order, then country order).
    country_to_region: IndexMap<CountryCode, RegionId>,
    fetched_at: Option<Instant>,
}

impl DirectorySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Flattens the countries of every region into a single mapping.
    ///
    /// Country codes are lowercased. A code listed by several regions belongs to the last one.
    pub fn from_regions(regions: Vec<Region>, fetched_at: Instant) -> Self {
        let mut country_to_region = IndexMap::new();
        for region in regions {
            for country in region.countries {
                if country.is_empty() {
                    tracing::debug!(region = %region.id, "Region lists a country without a code");
                }
                country_to_region.insert(country.to_ascii_lowercase(), region.id.clone());
            }
        }

        DirectorySnapshot {
            country_to_region,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.country_to_region.is_empty()
    }

    pub fn len(&self) -> usize {
        self.country_to_region.len()
    }

    pub fn contains(&self, country: &str) -> bool {
        self.country_to_region.contains_key(country)
    }

    pub fn region_for(&self, country: &str) -> Option<&str> {
        self.country_to_region.get(country).map(String::as_str)
    }

    /// Country codes in catalog order.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.country_to_region.keys().map(String::as_str)
    }

    pub fn fetched_at(&self) -> Option<Instant> {
        self.fetched_at
    }

    /// A snapshot that was never fetched is always stale.
    pub fn is_stale(&self, max_age: Duration, now: Instant) -> bool {
        match self.fetched_at {
            Some(fetched_at) => now.saturating_duration_since(fetched_at) >= max_age,
            None => true,
        }
    }
}
