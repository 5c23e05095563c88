//! Cleanup location classification and coordinate resolution for the map.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::Geocoder;

/// Kind of place a cleanup happened at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Beach,
    Park,
    Street,
    Forest,
}

/// Keywords per type: matched against the location label and the caption.
struct Keywords {
    kind: LocationType,
    label: &'static [&'static str],
    caption: &'static [&'static str],
}

const KEYWORDS: [Keywords; 3] = [
    Keywords {
        kind: LocationType::Beach,
        label: &["beach", "sea"],
        caption: &["beach"],
    },
    Keywords {
        kind: LocationType::Park,
        label: &["park", "garden"],
        caption: &["park"],
    },
    Keywords {
        kind: LocationType::Forest,
        label: &["forest", "jungle"],
        caption: &["forest"],
    },
];

impl LocationType {
    pub const ALL: [Self; 4] = [Self::Beach, Self::Park, Self::Street, Self::Forest];

    /// Classify a post by case-insensitive keyword matching.
    ///
    /// Beach wins over park, park over forest; with no match the post is
    /// treated as a street cleanup.
    #[must_use]
    pub fn classify(label: &str, caption: &str) -> Self {
        let label = label.to_lowercase();
        let caption = caption.to_lowercase();

        KEYWORDS
            .iter()
            .find(|k| {
                k.label.iter().any(|w| label.contains(w))
                    || k.caption.iter().any(|w| caption.contains(w))
            })
            .map_or(Self::Street, |k| k.kind)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beach => "beach",
            Self::Park => "park",
            Self::Street => "street",
            Self::Forest => "forest",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beach" => Some(Self::Beach),
            "park" => Some(Self::Park),
            "street" => Some(Self::Street),
            "forest" => Some(Self::Forest),
            _ => None,
        }
    }

    /// Tab label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Beach => "Beach",
            Self::Park => "Park",
            Self::Street => "Street",
            Self::Forest => "Forest",
        }
    }

    /// Icon name shown next to the type.
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Beach => "water",
            Self::Park | Self::Forest => "leaf",
            Self::Street => "car",
        }
    }

    /// Marker and badge colour.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Beach => "#4A90E2",
            Self::Park => "#7ED321",
            Self::Street => "#F5A623",
            Self::Forest => "#50E3C2",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map filter: everything or a single location type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationFilter {
    #[default]
    All,
    Only(LocationType),
}

impl LocationFilter {
    #[must_use]
    pub fn matches(self, kind: LocationType) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == kind,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(kind) => kind.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Visible map region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center: Coordinates,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    #[must_use]
    pub fn around(center: Coordinates) -> Self {
        Self {
            center,
            latitude_delta: 0.0922,
            longitude_delta: 0.0421,
        }
    }
}

/// Where a location's coordinates came from.
///
/// `Approximate` coordinates are a random point near the reference centre,
/// not a real position; callers should not present them as accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSource {
    Geocoded,
    Approximate,
    Demo,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCoordinates {
    pub coordinates: Coordinates,
    pub source: CoordinateSource,
}

/// Jitter `reference` by a uniform offset in `[-spread / 2, spread / 2)`
/// degrees on each axis.
pub fn jitter<R: Rng + ?Sized>(reference: Coordinates, spread: f64, rng: &mut R) -> Coordinates {
    Coordinates {
        latitude: reference.latitude + (rng.gen::<f64>() - 0.5) * spread,
        longitude: reference.longitude + (rng.gen::<f64>() - 0.5) * spread,
    }
}

/// Forward-geocode a free-text label, falling back to a jittered point near
/// `reference` when geocoding fails or finds nothing.
pub async fn resolve_coordinates<R: Rng + Send + ?Sized>(
    geocoder: &dyn Geocoder,
    label: &str,
    reference: Coordinates,
    spread: f64,
    rng: &mut R,
) -> ResolvedCoordinates {
    match geocoder.geocode(label).await {
        Ok(found) => {
            if let Some(first) = found.into_iter().next() {
                return ResolvedCoordinates {
                    coordinates: first,
                    source: CoordinateSource::Geocoded,
                };
            }
            debug!(label = %label, "Geocoder found no match, using approximate coordinates");
        }
        Err(e) => {
            debug!(label = %label, error = %e, "Failed to geocode location, using approximate coordinates");
        }
    }

    ResolvedCoordinates {
        coordinates: jitter(reference, spread, rng),
        source: CoordinateSource::Approximate,
    }
}
