//! In-memory implementation of [`Store`].
//!
//! All tables live behind one lock. A transaction owns the write guard for its
//! whole lifetime, so transactions are serialised. The first write of a
//! transaction copies the tables; the copy is restored if the transaction is
//! dropped uncommitted. Read-only transactions copy nothing, but a write pays
//! for a copy of every table.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use stellar_core::constellation::starts_with_ignore_case;
use stellar_core::{
    Constellation, ConstellationFilter, ConstellationId, ConstellationPatch, ConstellationStatus,
    NewConstellation, NewUser, Planet, PlanetFields, PlanetId, PlanetStatus, Result, StellarError,
    User, UserAccount, UserId,
};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

use crate::repo::{CatalogRepo, ConstellationRepo, Store, Transaction, UserRepo};

#[derive(Debug, Clone, Default)]
struct Tables {
    constellations: BTreeMap<ConstellationId, Constellation>,
    /// Membership links keyed by (constellation, planet).
    links: BTreeSet<(ConstellationId, PlanetId)>,
    planets: BTreeMap<PlanetId, Planet>,
    users: BTreeMap<UserId, UserAccount>,
    last_constellation_id: ConstellationId,
    last_planet_id: PlanetId,
    last_user_id: UserId,
}

impl Tables {
    fn draft_of(&self, user_id: UserId) -> Option<&Constellation> {
        self.constellations
            .values()
            .find(|c| c.user_id == user_id && c.status == ConstellationStatus::Draft)
    }
}

/// In-memory relational store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let guard = self.tables.clone().write_owned().await;
        Ok(Box::new(MemoryTransaction {
            tables: guard,
            backup: None,
        }))
    }
}

/// A transaction over [`InMemoryStore`].
pub struct MemoryTransaction {
    tables: OwnedRwLockWriteGuard<Tables>,
    /// Snapshot taken on the first write and restored on drop; `None` once committed.
    backup: Option<Tables>,
}

impl MemoryTransaction {
    fn read(&self) -> &Tables {
        &self.tables
    }

    fn write(&mut self) -> &mut Tables {
        if self.backup.is_none() {
            self.backup = Some(Tables::clone(&self.tables));
        }
        &mut self.tables
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if let Some(backup) = self.backup.take() {
            *self.tables = backup;
            debug!("transaction rolled back");
        }
    }
}

#[async_trait]
impl ConstellationRepo for MemoryTransaction {
    async fn find_constellations(
        &mut self,
        filter: &ConstellationFilter,
    ) -> Result<Vec<Constellation>> {
        let mut rows: Vec<Constellation> = self
            .read()
            .constellations
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        filter.sort(&mut rows);
        Ok(rows)
    }

    async fn get_constellation(&mut self, id: ConstellationId) -> Result<Option<Constellation>> {
        Ok(self.read().constellations.get(&id).cloned())
    }

    async fn find_draft(&mut self, user_id: UserId) -> Result<Option<Constellation>> {
        Ok(self.read().draft_of(user_id).cloned())
    }

    async fn create_constellation(&mut self, new: NewConstellation) -> Result<Constellation> {
        if new.status == ConstellationStatus::Draft && self.read().draft_of(new.user_id).is_some()
        {
            return Err(StellarError::DraftConflict(new.user_id));
        }

        let tables = self.write();
        tables.last_constellation_id += 1;
        let row = Constellation {
            id: tables.last_constellation_id,
            name: new.name,
            start_date: new.start_date,
            end_date: new.end_date,
            created_at: new.created_at,
            formed_at: None,
            confirmed_at: None,
            status: new.status,
            user_id: new.user_id,
            moderator_id: None,
        };
        tables.constellations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_constellation(
        &mut self,
        id: ConstellationId,
        patch: ConstellationPatch,
    ) -> Result<Constellation> {
        let tables = self.read();
        let current = tables
            .constellations
            .get(&id)
            .ok_or_else(|| StellarError::constellation_not_found(id))?;

        if patch.status == Some(ConstellationStatus::Draft)
            && current.status != ConstellationStatus::Draft
            && tables.draft_of(current.user_id).is_some()
        {
            return Err(StellarError::DraftConflict(current.user_id));
        }

        let row = self
            .write()
            .constellations
            .get_mut(&id)
            .ok_or_else(|| StellarError::constellation_not_found(id))?;
        patch.apply(row);
        Ok(row.clone())
    }

    async fn insert_link(
        &mut self,
        constellation_id: ConstellationId,
        planet_id: PlanetId,
    ) -> Result<()> {
        let tables = self.read();
        if !tables.constellations.contains_key(&constellation_id) {
            return Err(StellarError::constellation_not_found(constellation_id));
        }
        if !tables.planets.contains_key(&planet_id) {
            return Err(StellarError::planet_not_found(planet_id));
        }
        if tables.links.contains(&(constellation_id, planet_id)) {
            return Err(StellarError::DuplicateMembership {
                constellation_id,
                planet_id,
            });
        }
        self.write().links.insert((constellation_id, planet_id));
        Ok(())
    }

    async fn delete_link(
        &mut self,
        constellation_id: ConstellationId,
        planet_id: PlanetId,
    ) -> Result<bool> {
        let key = (constellation_id, planet_id);
        if !self.read().links.contains(&key) {
            return Ok(false);
        }
        Ok(self.write().links.remove(&key))
    }

    async fn delete_all_links(&mut self, constellation_id: ConstellationId) -> Result<usize> {
        let links = &mut self.write().links;
        let before = links.len();
        links.retain(|(linked, _)| *linked != constellation_id);
        Ok(before - links.len())
    }

    async fn linked_planets(&mut self, constellation_id: ConstellationId) -> Result<Vec<PlanetId>> {
        Ok(self
            .read()
            .links
            .range((constellation_id, PlanetId::MIN)..=(constellation_id, PlanetId::MAX))
            .map(|(_, planet_id)| *planet_id)
            .collect())
    }
}

#[async_trait]
impl CatalogRepo for MemoryTransaction {
    async fn get_planet(&mut self, id: PlanetId) -> Result<Option<Planet>> {
        Ok(self.read().planets.get(&id).cloned())
    }

    async fn find_active_planets(&mut self, name_prefix: &str) -> Result<Vec<Planet>> {
        let prefix = name_prefix.trim();
        Ok(self
            .read()
            .planets
            .values()
            .filter(|p| p.is_active() && starts_with_ignore_case(&p.name, prefix))
            .cloned()
            .collect())
    }

    async fn create_planet(&mut self, fields: PlanetFields) -> Result<Planet> {
        let tables = self.write();
        tables.last_planet_id += 1;
        let mut planet = Planet {
            id: tables.last_planet_id,
            name: String::new(),
            discovered: String::new(),
            mass: String::new(),
            distance: String::new(),
            info: String::new(),
            color1: String::new(),
            color2: String::new(),
            status: PlanetStatus::Active,
            image_url: None,
        };
        fields.apply(&mut planet);
        tables.planets.insert(planet.id, planet.clone());
        Ok(planet)
    }

    async fn save_planet(&mut self, planet: &Planet) -> Result<()> {
        if !self.read().planets.contains_key(&planet.id) {
            return Err(StellarError::planet_not_found(planet.id));
        }
        self.write().planets.insert(planet.id, planet.clone());
        Ok(())
    }
}

#[async_trait]
impl UserRepo for MemoryTransaction {
    async fn get_user(&mut self, id: UserId) -> Result<Option<User>> {
        Ok(self.read().users.get(&id).map(|account| account.user.clone()))
    }

    async fn find_account(&mut self, email: &str) -> Result<Option<UserAccount>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|account| account.user.email == email)
            .cloned())
    }

    async fn create_user(&mut self, new: NewUser) -> Result<User> {
        if self.find_account(&new.email).await?.is_some() {
            return Err(StellarError::EmailTaken(new.email));
        }

        let tables = self.write();
        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            full_name: new.full_name,
            email: new.email,
            role: new.role,
        };
        tables.users.insert(
            user.id,
            UserAccount {
                user: user.clone(),
                password_salt: new.password_salt,
                password_digest: new.password_digest,
            },
        );
        Ok(user)
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.backup = None;
        Ok(())
    }
}
