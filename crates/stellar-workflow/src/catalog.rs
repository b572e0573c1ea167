//! Catalog service: planet listing, curation and image upload.

use std::sync::Arc;

use stellar_core::{Actor, Planet, PlanetFields, PlanetId, PlanetStatus, Result, StellarError};
use stellar_store::{CatalogRepo, ImageStore, Store};
use tracing::{info, warn};
use uuid::Uuid;

/// Default upper bound for uploaded images.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Largest allowed page size.
pub const MAX_PAGE_SIZE: usize = 100;

/// A 1-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    pub fn validate(&self) -> Result<()> {
        if self.number == 0 {
            return Err(StellarError::Validation("page starts at 1".to_string()));
        }
        if self.size == 0 || self.size > MAX_PAGE_SIZE {
            return Err(StellarError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    /// Index of the first item on this page, or `None` past the addressable range.
    pub fn offset(&self) -> Option<usize> {
        self.number.checked_sub(1)?.checked_mul(self.size)
    }
}

/// Catalog operations over the relational store and the image store.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    images: Arc<dyn ImageStore>,
    max_image_bytes: usize,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, images: Arc<dyn ImageStore>) -> Self {
        Self {
            store,
            images,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    /// Set the upload size limit.
    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    /// Active planets whose name starts with `name_prefix`, ordered by id.
    pub async fn list_planets(&self, name_prefix: &str, page: Option<Page>) -> Result<Vec<Planet>> {
        if let Some(page) = page {
            page.validate()?;
        }

        let mut tx = self.store.begin().await?;
        let planets = tx.find_active_planets(name_prefix).await?;
        tx.commit().await?;

        Ok(match page {
            Some(page) => match page.offset() {
                Some(offset) => planets.into_iter().skip(offset).take(page.size).collect(),
                None => Vec::new(),
            },
            None => planets,
        })
    }

    /// An active planet.
    pub async fn get_planet(&self, id: PlanetId) -> Result<Planet> {
        validate_id(id)?;

        let mut tx = self.store.begin().await?;
        let planet = tx
            .get_active_planet(id)
            .await?
            .ok_or_else(|| StellarError::planet_not_found(id))?;
        tx.commit().await?;
        Ok(planet)
    }

    pub async fn create_planet(&self, actor: &Actor, fields: PlanetFields) -> Result<Planet> {
        require_curator(actor)?;
        fields.validate()?;

        let mut tx = self.store.begin().await?;
        let planet = tx.create_planet(fields).await?;
        tx.commit().await?;

        info!(planet_id = planet.id, moderator_id = actor.id, "planet created");
        Ok(planet)
    }

    pub async fn update_planet(
        &self,
        actor: &Actor,
        id: PlanetId,
        fields: PlanetFields,
    ) -> Result<Planet> {
        require_curator(actor)?;
        validate_id(id)?;
        fields.validate()?;

        let mut tx = self.store.begin().await?;
        let mut planet = tx
            .get_active_planet(id)
            .await?
            .ok_or_else(|| StellarError::planet_not_found(id))?;
        fields.apply(&mut planet);
        tx.save_planet(&planet).await?;
        tx.commit().await?;

        info!(planet_id = id, moderator_id = actor.id, "planet updated");
        Ok(planet)
    }

    /// Soft-delete a planet and drop its stored image.
    pub async fn delete_planet(&self, actor: &Actor, id: PlanetId) -> Result<()> {
        require_curator(actor)?;
        validate_id(id)?;

        let mut tx = self.store.begin().await?;
        let mut planet = tx
            .get_active_planet(id)
            .await?
            .ok_or_else(|| StellarError::planet_not_found(id))?;
        planet.status = PlanetStatus::Deleted;
        let image = planet.image_url.take();
        tx.save_planet(&planet).await?;
        tx.commit().await?;

        if let Some(url) = image {
            self.discard_image(&url).await;
        }

        info!(planet_id = id, moderator_id = actor.id, "planet deleted");
        Ok(())
    }

    /// Store an image for a planet, replacing any previous one.
    pub async fn upload_planet_image(
        &self,
        actor: &Actor,
        id: PlanetId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<Planet> {
        require_curator(actor)?;
        validate_id(id)?;
        if bytes.is_empty() {
            return Err(StellarError::Validation("image body is empty".to_string()));
        }
        if !content_type.starts_with("image/") {
            return Err(StellarError::Validation(format!(
                "unsupported content type '{content_type}'"
            )));
        }
        if bytes.len() > self.max_image_bytes {
            return Err(StellarError::Validation(format!(
                "image exceeds {} bytes",
                self.max_image_bytes
            )));
        }

        let mut tx = self.store.begin().await?;
        let mut planet = tx
            .get_active_planet(id)
            .await?
            .ok_or_else(|| StellarError::planet_not_found(id))?;

        let key = format!("planets/{id}/{}", Uuid::new_v4());
        let url = self.images.put(&key, bytes, content_type).await?;
        let previous = planet.image_url.replace(url.clone());

        let saved = match tx.save_planet(&planet).await {
            Ok(()) => tx.commit().await,
            Err(err) => Err(err),
        };
        if let Err(err) = saved {
            self.discard_image(&url).await;
            return Err(err);
        }

        if let Some(previous) = previous {
            self.discard_image(&previous).await;
        }

        info!(planet_id = id, moderator_id = actor.id, "planet image uploaded");
        Ok(planet)
    }

    /// Remove an object no row points at any more. Failures leave an orphan and are only logged.
    async fn discard_image(&self, url: &str) {
        if let Err(err) = self.images.remove(url).await {
            warn!(url, error = %err, "failed to remove stored image");
        }
    }
}

fn require_curator(actor: &Actor) -> Result<()> {
    actor.validate()?;
    if !actor.role.can_curate_catalog() {
        return Err(StellarError::Forbidden(
            "only moderators may change the catalog".to_string(),
        ));
    }
    Ok(())
}

fn validate_id(id: PlanetId) -> Result<()> {
    if id <= 0 {
        return Err(StellarError::InvalidId {
            resource: "planet",
            id,
        });
    }
    Ok(())
}
