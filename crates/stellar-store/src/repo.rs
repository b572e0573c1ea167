//! Store contracts.
//!
//! Every operation is issued through a [`Transaction`] obtained from
//! [`Store::begin`]. Writes become visible only after [`Transaction::commit`];
//! a transaction dropped without committing is rolled back.

use async_trait::async_trait;
use stellar_core::{
    Constellation, ConstellationFilter, ConstellationId, ConstellationPatch, NewConstellation,
    NewUser, Planet, PlanetFields, PlanetId, Result, User, UserAccount, UserId,
};

/// Constellation rows and their planet memberships.
#[async_trait]
pub trait ConstellationRepo: Send {
    /// All visible rows matching `filter`, ordered as it requests.
    async fn find_constellations(
        &mut self,
        filter: &ConstellationFilter,
    ) -> Result<Vec<Constellation>>;

    /// A row by id, in any status.
    async fn get_constellation(&mut self, id: ConstellationId) -> Result<Option<Constellation>>;

    /// The user's current draft, if any.
    async fn find_draft(&mut self, user_id: UserId) -> Result<Option<Constellation>>;

    /// Insert a row. Fails with `DraftConflict` if it would give a user a second draft.
    async fn create_constellation(&mut self, new: NewConstellation) -> Result<Constellation>;

    /// Apply a partial update and return the updated row.
    async fn update_constellation(
        &mut self,
        id: ConstellationId,
        patch: ConstellationPatch,
    ) -> Result<Constellation>;

    /// Link a planet. Fails with `DuplicateMembership` if the pair exists.
    async fn insert_link(
        &mut self,
        constellation_id: ConstellationId,
        planet_id: PlanetId,
    ) -> Result<()>;

    /// Unlink a planet. Returns false if the pair did not exist.
    async fn delete_link(
        &mut self,
        constellation_id: ConstellationId,
        planet_id: PlanetId,
    ) -> Result<bool>;

    /// Unlink every planet of a constellation, returning how many links were removed.
    async fn delete_all_links(&mut self, constellation_id: ConstellationId) -> Result<usize>;

    /// Planet ids linked to a constellation, ascending.
    async fn linked_planets(&mut self, constellation_id: ConstellationId) -> Result<Vec<PlanetId>>;
}

/// Catalog planets.
#[async_trait]
pub trait CatalogRepo: Send {
    /// A planet by id, in any status.
    async fn get_planet(&mut self, id: PlanetId) -> Result<Option<Planet>>;

    /// A planet by id, only if it is active.
    async fn get_active_planet(&mut self, id: PlanetId) -> Result<Option<Planet>> {
        Ok(self.get_planet(id).await?.filter(Planet::is_active))
    }

    /// Active planets whose name starts with `name_prefix` (case-insensitive), by id.
    async fn find_active_planets(&mut self, name_prefix: &str) -> Result<Vec<Planet>>;

    /// Insert an active planet.
    async fn create_planet(&mut self, fields: PlanetFields) -> Result<Planet>;

    /// Overwrite an existing planet row.
    async fn save_planet(&mut self, planet: &Planet) -> Result<()>;
}

/// User accounts.
#[async_trait]
pub trait UserRepo: Send {
    /// A user by id.
    async fn get_user(&mut self, id: UserId) -> Result<Option<User>>;

    /// The account registered under an already normalized email.
    async fn find_account(&mut self, email: &str) -> Result<Option<UserAccount>>;

    /// Insert an account. Fails with `EmailTaken` if the email is in use.
    async fn create_user(&mut self, new: NewUser) -> Result<User>;
}

/// One atomic unit of work over every repository.
#[async_trait]
pub trait Transaction: ConstellationRepo + CatalogRepo + UserRepo {
    /// Make every write of this transaction visible.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Entry point to the relational store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a transaction.
    async fn begin(&self) -> Result<Box<dyn Transaction>>;
}
