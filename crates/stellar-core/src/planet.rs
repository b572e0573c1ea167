//! Catalog planets.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StellarError};
use crate::types::{PlanetId, PlanetStatus};

/// A catalog planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: PlanetId,
    pub name: String,
    /// Free-text discovery note.
    pub discovered: String,
    pub mass: String,
    pub distance: String,
    pub info: String,
    /// Primary display color, e.g. `#ababab`.
    pub color1: String,
    /// Secondary display color.
    pub color2: String,
    pub status: PlanetStatus,
    /// Public URL of the uploaded image.
    pub image_url: Option<String>,
}

impl Planet {
    pub fn is_active(&self) -> bool {
        self.status == PlanetStatus::Active
    }
}

/// Lightweight planet view embedded in constellation responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetSummary {
    pub id: PlanetId,
    pub name: String,
    pub color1: String,
    pub color2: String,
    pub image_url: Option<String>,
}

impl From<&Planet> for PlanetSummary {
    fn from(planet: &Planet) -> Self {
        Self {
            id: planet.id,
            name: planet.name.clone(),
            color1: planet.color1.clone(),
            color2: planet.color2.clone(),
            image_url: planet.image_url.clone(),
        }
    }
}

/// Editable catalog fields, used for both create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetFields {
    pub name: String,
    pub discovered: String,
    pub mass: String,
    pub distance: String,
    pub info: String,
    pub color1: String,
    pub color2: String,
}

impl PlanetFields {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StellarError::Validation(
                "planet name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy the fields onto an existing planet, keeping status and image.
    pub fn apply(self, planet: &mut Planet) {
        planet.name = self.name;
        planet.discovered = self.discovered;
        planet.mass = self.mass;
        planet.distance = self.distance;
        planet.info = self.info;
        planet.color1 = self.color1;
        planet.color2 = self.color2;
    }
}
