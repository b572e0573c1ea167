//! Constellation workflow engine.
//!
//! The engine owns every status change and every ownership decision for
//! constellations. Each operation runs inside a single store transaction.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use stellar_core::{
    Actor, Constellation, ConstellationDetail, ConstellationFields, ConstellationFilter,
    ConstellationId, ConstellationListing, ConstellationQuery, ConstellationStatus,
    NewConstellation, PlanetId, PlanetSummary, Result, SortOrder, StellarError, UserId,
};
use stellar_store::{CatalogRepo, ConstellationRepo, Store, Transaction, UserRepo};
use tracing::{debug, info};

use crate::machine::Transition;

/// Which statuses allow owner field edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditPolicy {
    /// Any visible status.
    #[default]
    AnyStatus,
    /// Drafts only.
    DraftOnly,
}

/// The caller's current draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DraftSummary {
    pub id: ConstellationId,
    pub planet_count: usize,
}

/// Workflow engine over a relational store.
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn Store>,
    edit_policy: EditPolicy,
}

impl WorkflowEngine {
    /// Create an engine with the default edit policy.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            edit_policy: EditPolicy::default(),
        }
    }

    /// Set the edit policy.
    pub fn with_edit_policy(mut self, edit_policy: EditPolicy) -> Self {
        self.edit_policy = edit_policy;
        self
    }

    /// List visible constellations with their owners' names.
    ///
    /// Users see their own rows, oldest first. Moderators see every user's rows,
    /// newest first.
    pub async fn list_constellations(
        &self,
        query: ConstellationQuery,
        actor: &Actor,
    ) -> Result<Vec<ConstellationListing>> {
        actor.validate()?;

        let filter = if actor.role.can_moderate() {
            ConstellationFilter {
                owner: None,
                query,
                order: SortOrder::Descending,
            }
        } else {
            ConstellationFilter {
                owner: Some(actor.id),
                query,
                order: SortOrder::Ascending,
            }
        };

        let mut tx = self.store.begin().await?;
        let rows = tx.find_constellations(&filter).await?;

        let mut names: BTreeMap<UserId, Option<String>> = BTreeMap::new();
        let mut listings = Vec::with_capacity(rows.len());
        for constellation in rows {
            let owner_name = match names.get(&constellation.user_id) {
                Some(name) => name.clone(),
                None => {
                    let name = owner_name(tx.as_mut(), constellation.user_id).await?;
                    names.insert(constellation.user_id, name.clone());
                    name
                }
            };
            listings.push(ConstellationListing {
                constellation,
                owner_name,
            });
        }
        tx.commit().await?;
        Ok(listings)
    }

    /// Fetch a constellation with its owner's name and its planets.
    ///
    /// Rows that are deleted, or owned by someone else when the caller is a user,
    /// are reported as not found.
    pub async fn get_constellation(
        &self,
        id: ConstellationId,
        actor: &Actor,
    ) -> Result<ConstellationDetail> {
        if id <= 0 {
            return Err(StellarError::constellation_not_found(id));
        }
        actor.validate()?;

        let mut tx = self.store.begin().await?;
        let constellation = match tx.get_constellation(id).await? {
            Some(row) if row.status.is_visible() => row,
            _ => return Err(StellarError::constellation_not_found(id)),
        };
        if !actor.role.can_moderate() && !constellation.is_owned_by(actor.id) {
            return Err(StellarError::constellation_not_found(id));
        }

        let owner_name = owner_name(tx.as_mut(), constellation.user_id).await?;
        let planets = planet_summaries(tx.as_mut(), id).await?;
        tx.commit().await?;

        Ok(ConstellationDetail {
            constellation,
            owner_name,
            planets,
        })
    }

    /// The user's current draft and its size, if one exists.
    pub async fn current_draft(&self, user_id: UserId) -> Result<Option<DraftSummary>> {
        validate_user(user_id)?;

        let mut tx = self.store.begin().await?;
        let summary = match tx.find_draft(user_id).await? {
            Some(draft) => Some(DraftSummary {
                id: draft.id,
                planet_count: tx.linked_planets(draft.id).await?.len(),
            }),
            None => None,
        };
        tx.commit().await?;
        Ok(summary)
    }

    /// Add an active planet to the owner's draft, creating the draft if needed.
    ///
    /// Returns the draft the planet was added to.
    pub async fn add_planet_to_draft(
        &self,
        planet_id: PlanetId,
        actor: &Actor,
    ) -> Result<Constellation> {
        validate_planet(planet_id)?;
        require_owner(actor)?;
        let user_id = actor.id;

        let mut tx = self.store.begin().await?;
        if tx.get_active_planet(planet_id).await?.is_none() {
            return Err(StellarError::planet_not_found(planet_id));
        }

        let draft = match tx.find_draft(user_id).await? {
            Some(draft) => draft,
            None => {
                let draft = tx
                    .create_constellation(NewConstellation::draft(user_id, Utc::now()))
                    .await?;
                info!(constellation_id = draft.id, user_id, "created draft constellation");
                draft
            }
        };

        tx.insert_link(draft.id, planet_id).await?;
        tx.commit().await?;

        debug!(constellation_id = draft.id, planet_id, "planet added to draft");
        Ok(draft)
    }

    /// Remove a planet from the owner's draft. The draft's status is not touched.
    pub async fn remove_planet_from_draft(&self, planet_id: PlanetId, actor: &Actor) -> Result<()> {
        validate_planet(planet_id)?;
        require_owner(actor)?;
        let user_id = actor.id;

        let mut tx = self.store.begin().await?;
        if tx.get_planet(planet_id).await?.is_none() {
            return Err(StellarError::planet_not_found(planet_id));
        }

        let removed = match tx.find_draft(user_id).await? {
            Some(draft) => tx.delete_link(draft.id, planet_id).await?,
            None => false,
        };
        if !removed {
            return Err(StellarError::NotOwnedOrNotDraft { planet_id, user_id });
        }
        tx.commit().await?;

        debug!(planet_id, user_id, "planet removed from draft");
        Ok(())
    }

    /// Delete the owner's draft: unlink every planet and mark it deleted, atomically.
    pub async fn delete_constellation(&self, id: ConstellationId, actor: &Actor) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let row = owned_row(tx.as_mut(), id, actor).await?;
        let patch = Transition::Delete.apply(&row, actor, Utc::now())?;

        let unlinked = tx.delete_all_links(id).await?;
        tx.update_constellation(id, patch).await?;
        tx.commit().await?;

        info!(
            constellation_id = id,
            user_id = actor.id,
            unlinked,
            "constellation deleted"
        );
        Ok(())
    }

    /// Update name and dates of an owned constellation.
    pub async fn update_constellation_fields(
        &self,
        id: ConstellationId,
        actor: &Actor,
        fields: ConstellationFields,
    ) -> Result<Constellation> {
        fields.validate()?;

        let mut tx = self.store.begin().await?;
        let row = owned_row(tx.as_mut(), id, actor).await?;
        if self.edit_policy == EditPolicy::DraftOnly && row.status != ConstellationStatus::Draft {
            return Err(StellarError::NotEditable {
                id,
                status: row.status,
            });
        }

        let updated = tx.update_constellation(id, fields.into_patch()).await?;
        tx.commit().await?;

        debug!(constellation_id = id, "constellation fields updated");
        Ok(updated)
    }

    /// State machine entry point.
    ///
    /// A user may only request `work`, which submits their current draft and
    /// ignores `id`. A moderator may request `completed` or `rejected` for the
    /// constellation `id`, which must be in `work`.
    pub async fn transition_status(
        &self,
        id: ConstellationId,
        actor: &Actor,
        target: ConstellationStatus,
    ) -> Result<Constellation> {
        actor.validate()?;

        match Transition::requested(actor.role, target)? {
            Transition::Submit => self.submit_draft(actor).await,
            review => self.review(id, actor, review).await,
        }
    }

    /// Submit the caller's draft for review.
    pub async fn submit_draft(&self, actor: &Actor) -> Result<Constellation> {
        require_owner(actor)?;

        let mut tx = self.store.begin().await?;
        let draft = tx
            .find_draft(actor.id)
            .await?
            .ok_or(StellarError::NoDraft(actor.id))?;
        if tx.linked_planets(draft.id).await?.is_empty() {
            return Err(StellarError::EmptyDraft(draft.id));
        }

        let patch = Transition::Submit.apply(&draft, actor, Utc::now())?;
        let submitted = tx.update_constellation(draft.id, patch).await?;
        tx.commit().await?;

        info!(
            constellation_id = submitted.id,
            user_id = actor.id,
            from = %ConstellationStatus::Draft,
            to = %submitted.status,
            "draft submitted"
        );
        Ok(submitted)
    }

    /// Apply a moderator's approve or reject decision.
    async fn review(
        &self,
        id: ConstellationId,
        actor: &Actor,
        decision: Transition,
    ) -> Result<Constellation> {
        if id <= 0 {
            return Err(StellarError::InvalidId {
                resource: "constellation",
                id,
            });
        }

        let mut tx = self.store.begin().await?;
        let row = tx
            .get_constellation(id)
            .await?
            .ok_or_else(|| StellarError::constellation_not_found(id))?;
        let from = row.status;
        let patch = decision.apply(&row, actor, Utc::now())?;
        let decided = tx.update_constellation(id, patch).await?;
        tx.commit().await?;

        info!(
            constellation_id = id,
            moderator_id = actor.id,
            from = %from,
            to = %decided.status,
            "constellation reviewed"
        );
        Ok(decided)
    }
}

/// Drafts belong to plain users; moderators never own one.
fn require_owner(actor: &Actor) -> Result<()> {
    actor.validate()?;
    if actor.role.can_moderate() {
        return Err(StellarError::Forbidden(
            "moderators do not own constellations".to_string(),
        ));
    }
    Ok(())
}

/// Load a visible row the actor owns, for owner-only operations.
async fn owned_row(
    tx: &mut dyn Transaction,
    id: ConstellationId,
    actor: &Actor,
) -> Result<Constellation> {
    if id <= 0 {
        return Err(StellarError::InvalidId {
            resource: "constellation",
            id,
        });
    }
    require_owner(actor)?;

    let row = match tx.get_constellation(id).await? {
        Some(row) if row.status.is_visible() => row,
        _ => return Err(StellarError::constellation_not_found(id)),
    };
    if !row.is_owned_by(actor.id) {
        return Err(StellarError::NotOwned {
            constellation_id: id,
            user_id: actor.id,
        });
    }
    Ok(row)
}

async fn owner_name(tx: &mut dyn Transaction, user_id: UserId) -> Result<Option<String>> {
    Ok(tx.get_user(user_id).await?.map(|user| user.full_name))
}

async fn planet_summaries(
    tx: &mut dyn Transaction,
    id: ConstellationId,
) -> Result<Vec<PlanetSummary>> {
    let mut planets = Vec::new();
    for planet_id in tx.linked_planets(id).await? {
        if let Some(planet) = tx.get_planet(planet_id).await? {
            planets.push(PlanetSummary::from(&planet));
        }
    }
    Ok(planets)
}

fn validate_user(user_id: UserId) -> Result<()> {
    if user_id <= 0 {
        return Err(StellarError::InvalidActor(user_id));
    }
    Ok(())
}

fn validate_planet(planet_id: PlanetId) -> Result<()> {
    if planet_id <= 0 {
        return Err(StellarError::InvalidId {
            resource: "planet",
            id: planet_id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_core::PlanetFields;
    use stellar_store::InMemoryStore;

    const OWNER: UserId = 1;
    const OTHER: UserId = 2;
    const MODERATOR: UserId = 9;

    async fn setup(planets: &[&str]) -> (WorkflowEngine, InMemoryStore, Vec<PlanetId>) {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let mut ids = Vec::new();
        for name in planets {
            let planet = tx
                .create_planet(PlanetFields {
                    name: name.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
            ids.push(planet.id);
        }
        tx.commit().await.unwrap();

        let engine = WorkflowEngine::new(Arc::new(store.clone()));
        (engine, store, ids)
    }

    async fn link_count(store: &InMemoryStore, id: ConstellationId) -> usize {
        let mut tx = store.begin().await.unwrap();
        tx.linked_planets(id).await.unwrap().len()
    }

    async fn row(store: &InMemoryStore, id: ConstellationId) -> Constellation {
        let mut tx = store.begin().await.unwrap();
        tx.get_constellation(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_first_add_creates_draft() {
        let (engine, store, planets) = setup(&["Mercury", "Venus", "Earth", "Mars", "Jupiter"]).await;
        let mars = planets[3];

        let draft = engine.add_planet_to_draft(mars, &Actor::user(OWNER)).await.unwrap();
        assert_eq!(draft.status, ConstellationStatus::Draft);
        assert_eq!(draft.user_id, OWNER);
        assert_eq!(draft.name, stellar_core::DEFAULT_DRAFT_NAME);
        assert!(draft.moderator_id.is_none());
        assert_eq!(link_count(&store, draft.id).await, 1);

        // A second planet goes into the same draft.
        let again = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        assert_eq!(again.id, draft.id);
        assert_eq!(link_count(&store, draft.id).await, 2);
    }

    #[tokio::test]
    async fn test_add_duplicate_planet() {
        let (engine, store, planets) = setup(&["Mars"]).await;

        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        let err = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap_err();
        assert_eq!(
            err,
            StellarError::DuplicateMembership {
                constellation_id: draft.id,
                planet_id: planets[0],
            }
        );
        assert_eq!(link_count(&store, draft.id).await, 1);
    }

    #[tokio::test]
    async fn test_add_requires_active_planet() {
        let (engine, store, planets) = setup(&["Pluto"]).await;
        {
            let mut tx = store.begin().await.unwrap();
            let mut pluto = tx.get_planet(planets[0]).await.unwrap().unwrap();
            pluto.status = stellar_core::PlanetStatus::Deleted;
            tx.save_planet(&pluto).await.unwrap();
            tx.commit().await.unwrap();
        }

        assert!(matches!(
            engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await,
            Err(StellarError::NotFound { resource: "planet", .. })
        ));
        assert!(matches!(
            engine.add_planet_to_draft(0, &Actor::user(OWNER)).await,
            Err(StellarError::InvalidId { .. })
        ));
        assert!(matches!(
            engine.add_planet_to_draft(planets[0], &Actor::user(0)).await,
            Err(StellarError::InvalidActor(0))
        ));
        // A failed add must not leave an empty draft behind.
        assert!(engine.current_draft(OWNER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_planet() {
        let (engine, store, planets) = setup(&["Mars", "Venus"]).await;
        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();

        assert_eq!(
            engine.remove_planet_from_draft(planets[1], &Actor::user(OWNER)).await,
            Err(StellarError::NotOwnedOrNotDraft {
                planet_id: planets[1],
                user_id: OWNER,
            })
        );
        assert!(matches!(
            engine.remove_planet_from_draft(planets[0], &Actor::user(OTHER)).await,
            Err(StellarError::NotOwnedOrNotDraft { .. })
        ));

        engine.remove_planet_from_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        assert_eq!(link_count(&store, draft.id).await, 0);
        assert_eq!(row(&store, draft.id).await.status, ConstellationStatus::Draft);
    }

    #[tokio::test]
    async fn test_remove_from_submitted_constellation() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        engine.submit_draft(&Actor::user(OWNER)).await.unwrap();

        assert!(matches!(
            engine.remove_planet_from_draft(planets[0], &Actor::user(OWNER)).await,
            Err(StellarError::NotOwnedOrNotDraft { .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_sets_formation_date() {
        let (engine, store, planets) = setup(&["Mars"]).await;
        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();

        let submitted = engine
            .transition_status(0, &Actor::user(OWNER), ConstellationStatus::Work)
            .await
            .unwrap();
        assert_eq!(submitted.id, draft.id);
        assert_eq!(submitted.status, ConstellationStatus::Work);
        assert!(submitted.formed_at.is_some());
        assert!(submitted.confirmed_at.is_none());
        assert_eq!(link_count(&store, draft.id).await, 1);

        // The next addition starts a fresh draft.
        let next = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        assert_ne!(next.id, draft.id);
    }

    #[tokio::test]
    async fn test_submit_preconditions() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        let owner = Actor::user(OWNER);

        assert_eq!(
            engine.submit_draft(&owner).await,
            Err(StellarError::NoDraft(OWNER))
        );

        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        engine.remove_planet_from_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        assert_eq!(
            engine.submit_draft(&owner).await,
            Err(StellarError::EmptyDraft(draft.id))
        );
    }

    #[tokio::test]
    async fn test_moderator_approves_then_cannot_reject() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        engine.submit_draft(&Actor::user(OWNER)).await.unwrap();
        let moderator = Actor::moderator(MODERATOR);

        let completed = engine
            .transition_status(draft.id, &moderator, ConstellationStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, ConstellationStatus::Completed);
        assert!(completed.confirmed_at.is_some());
        assert_eq!(completed.moderator_id, Some(MODERATOR));

        assert_eq!(
            engine
                .transition_status(draft.id, &moderator, ConstellationStatus::Rejected)
                .await,
            Err(StellarError::InvalidTransition {
                from: ConstellationStatus::Completed,
                to: ConstellationStatus::Rejected,
            })
        );
    }

    #[tokio::test]
    async fn test_moderator_cannot_complete_draft() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();

        assert_eq!(
            engine
                .transition_status(draft.id, &Actor::moderator(MODERATOR), ConstellationStatus::Completed)
                .await,
            Err(StellarError::InvalidTransition {
                from: ConstellationStatus::Draft,
                to: ConstellationStatus::Completed,
            })
        );
        assert!(matches!(
            engine
                .transition_status(404, &Actor::moderator(MODERATOR), ConstellationStatus::Rejected)
                .await,
            Err(StellarError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_role_gating() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        engine.submit_draft(&Actor::user(OWNER)).await.unwrap();

        assert!(matches!(
            engine
                .transition_status(draft.id, &Actor::user(OWNER), ConstellationStatus::Completed)
                .await,
            Err(StellarError::Forbidden(_))
        ));
        assert!(matches!(
            engine
                .transition_status(draft.id, &Actor::moderator(MODERATOR), ConstellationStatus::Work)
                .await,
            Err(StellarError::Forbidden(_))
        ));
        assert!(matches!(
            engine
                .transition_status(draft.id, &Actor::user(OWNER), ConstellationStatus::Draft)
                .await,
            Err(StellarError::Forbidden(_))
        ));
        assert!(matches!(
            engine
                .delete_constellation(draft.id, &Actor::moderator(MODERATOR))
                .await,
            Err(StellarError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unlinks_and_hides() {
        let (engine, store, planets) = setup(&["Mercury", "Venus", "Earth"]).await;
        let mut draft_id = 0;
        for planet in &planets {
            draft_id = engine.add_planet_to_draft(*planet, &Actor::user(OWNER)).await.unwrap().id;
        }
        assert_eq!(link_count(&store, draft_id).await, 3);
        let owner = Actor::user(OWNER);

        engine.delete_constellation(draft_id, &owner).await.unwrap();
        assert_eq!(link_count(&store, draft_id).await, 0);
        assert_eq!(row(&store, draft_id).await.status, ConstellationStatus::Deleted);

        assert_eq!(
            engine.get_constellation(draft_id, &owner).await,
            Err(StellarError::constellation_not_found(draft_id))
        );
        assert!(engine
            .list_constellations(ConstellationQuery::default(), &owner)
            .await
            .unwrap()
            .is_empty());
        assert!(engine.current_draft(OWNER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_ownership_and_status() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();

        assert_eq!(
            engine.delete_constellation(draft.id, &Actor::user(OTHER)).await,
            Err(StellarError::NotOwned {
                constellation_id: draft.id,
                user_id: OTHER,
            })
        );
        assert!(matches!(
            engine.delete_constellation(77, &Actor::user(OWNER)).await,
            Err(StellarError::NotFound { .. })
        ));

        engine.submit_draft(&Actor::user(OWNER)).await.unwrap();
        assert_eq!(
            engine.delete_constellation(draft.id, &Actor::user(OWNER)).await,
            Err(StellarError::InvalidTransition {
                from: ConstellationStatus::Work,
                to: ConstellationStatus::Deleted,
            })
        );
    }

    #[tokio::test]
    async fn test_get_visibility() {
        let (engine, _store, planets) = setup(&["Mars", "Venus"]).await;
        engine.add_planet_to_draft(planets[1], &Actor::user(OWNER)).await.unwrap();
        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();

        let detail = engine
            .get_constellation(draft.id, &Actor::user(OWNER))
            .await
            .unwrap();
        let names: Vec<_> = detail.planets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Mars", "Venus"]);

        assert_eq!(
            engine.get_constellation(draft.id, &Actor::user(OTHER)).await,
            Err(StellarError::constellation_not_found(draft.id))
        );
        assert!(engine
            .get_constellation(draft.id, &Actor::moderator(MODERATOR))
            .await
            .is_ok());
        assert!(matches!(
            engine.get_constellation(0, &Actor::user(OWNER)).await,
            Err(StellarError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_scopes_and_order() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        let first = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        engine.submit_draft(&Actor::user(OWNER)).await.unwrap();
        let second = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        let foreign = engine.add_planet_to_draft(planets[0], &Actor::user(OTHER)).await.unwrap();

        let mine = engine
            .list_constellations(ConstellationQuery::default(), &Actor::user(OWNER))
            .await
            .unwrap();
        let ids: Vec<_> = mine.iter().map(|c| c.constellation.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let all = engine
            .list_constellations(ConstellationQuery::default(), &Actor::moderator(MODERATOR))
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.constellation.id).collect();
        assert_eq!(ids, vec![foreign.id, second.id, first.id]);

        let submitted = engine
            .list_constellations(
                ConstellationQuery {
                    status_prefix: Some("W".into()),
                    ..Default::default()
                },
                &Actor::moderator(MODERATOR),
            )
            .await
            .unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].constellation.id, first.id);

        assert_eq!(
            engine
                .list_constellations(ConstellationQuery::default(), &Actor::user(0))
                .await,
            Err(StellarError::InvalidActor(0))
        );
    }

    #[tokio::test]
    async fn test_update_fields() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        let now = Utc::now();
        let fields = ConstellationFields {
            name: " Lyra ".into(),
            start_date: now,
            end_date: now + chrono::Duration::days(3),
        };

        assert!(matches!(
            engine
                .update_constellation_fields(draft.id, &Actor::user(OTHER), fields.clone())
                .await,
            Err(StellarError::NotOwned { .. })
        ));

        let updated = engine
            .update_constellation_fields(draft.id, &Actor::user(OWNER), fields.clone())
            .await
            .unwrap();
        assert_eq!(updated.name, "Lyra");
        assert_eq!(updated.status, ConstellationStatus::Draft);

        // Default policy allows edits after submission.
        engine.submit_draft(&Actor::user(OWNER)).await.unwrap();
        assert!(engine
            .update_constellation_fields(draft.id, &Actor::user(OWNER), fields)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_draft_only_edit_policy() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        let engine = engine.with_edit_policy(EditPolicy::DraftOnly);
        let draft = engine.add_planet_to_draft(planets[0], &Actor::user(OWNER)).await.unwrap();
        engine.submit_draft(&Actor::user(OWNER)).await.unwrap();

        let now = Utc::now();
        let result = engine
            .update_constellation_fields(
                draft.id,
                &Actor::user(OWNER),
                ConstellationFields {
                    name: "Lyra".into(),
                    start_date: now,
                    end_date: now,
                },
            )
            .await;
        assert_eq!(
            result,
            Err(StellarError::NotEditable {
                id: draft.id,
                status: ConstellationStatus::Work,
            })
        );
    }

    #[tokio::test]
    async fn test_concurrent_first_adds_share_one_draft() {
        let (engine, store, planets) = setup(&["Mercury", "Venus", "Earth", "Mars"]).await;

        let mut handles = Vec::new();
        for planet in planets.clone() {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.add_planet_to_draft(planet, &Actor::user(OWNER)).await
            }));
        }
        let mut draft_ids = Vec::new();
        for handle in handles {
            draft_ids.push(handle.await.unwrap().unwrap().id);
        }
        draft_ids.dedup();
        assert_eq!(draft_ids.len(), 1);
        assert_eq!(link_count(&store, draft_ids[0]).await, planets.len());
    }

    #[tokio::test]
    async fn test_moderators_have_no_drafts() {
        let (engine, _store, planets) = setup(&["Mars"]).await;
        let moderator = Actor::moderator(MODERATOR);

        assert!(matches!(
            engine.add_planet_to_draft(planets[0], &moderator).await,
            Err(StellarError::Forbidden(_))
        ));
        assert!(matches!(
            engine.remove_planet_from_draft(planets[0], &moderator).await,
            Err(StellarError::Forbidden(_))
        ));
        assert!(engine.current_draft(MODERATOR).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_name_is_joined() {
        let (engine, store, planets) = setup(&["Mars"]).await;
        let ada = {
            let mut tx = store.begin().await.unwrap();
            let ada = tx
                .create_user(stellar_core::NewUser {
                    full_name: "Ada Lovelace".into(),
                    email: "ada@example.org".into(),
                    role: stellar_core::Role::User,
                    password_salt: "salt".into(),
                    password_digest: "digest".into(),
                })
                .await
                .unwrap();
            tx.commit().await.unwrap();
            ada
        };
        let owner = Actor::user(ada.id);
        let draft = engine.add_planet_to_draft(planets[0], &owner).await.unwrap();
        engine
            .add_planet_to_draft(planets[0], &Actor::user(OTHER))
            .await
            .unwrap();

        let detail = engine.get_constellation(draft.id, &owner).await.unwrap();
        assert_eq!(detail.owner_name.as_deref(), Some("Ada Lovelace"));

        let all = engine
            .list_constellations(ConstellationQuery::default(), &Actor::moderator(MODERATOR))
            .await
            .unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|c| (c.constellation.user_id, c.owner_name.as_deref()))
            .collect();
        assert_eq!(names, vec![(OTHER, None), (ada.id, Some("Ada Lovelace"))]);
    }
}
