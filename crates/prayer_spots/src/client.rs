use log::info;
use model::{
    image::{NewImage, SpotImage},
    profile::Profile,
    spot::{PrayerSpot, SpotDraft},
    WithDistance, WithId,
};
use utility::id::Id;

use crate::{
    auth::Identity,
    database::{Database, DatabaseTransaction, ImageRepo, ProfileRepo, SpotRepo},
    RequestError, RequestResult,
};

/// Typed accessor over the spot store. Every mutation is confirmed by the
/// store before any caller-visible state changes; the browsing surface
/// re-lists afterwards instead of patching its copy.
#[derive(Debug, Clone)]
pub struct Client<D>
where
    D: Database + Send + Sync + Sized + 'static,
{
    pub database: D,
}

impl<D> Client<D>
where
    D: Database,
{
    pub fn new(database: D) -> Self {
        Self { database }
    }

    /// All spots, newest first. Soft-deleted spots are included; the popup
    /// renders them with a Restore action instead of Delete.
    pub async fn list(&self) -> RequestResult<Vec<WithId<PrayerSpot>>> {
        Ok(self.database.auto().get_all().await?)
    }

    pub async fn get_by_slug(
        &self,
        slug: &str,
    ) -> RequestResult<Option<WithId<PrayerSpot>>> {
        Ok(self.database.auto().get_by_slug(slug).await?)
    }

    /// Creates a spot from a validated draft. Slug collisions are resolved by
    /// suffixing the name segment (`-2`, `-3`, ...) inside the same
    /// transaction as the insert.
    pub async fn create(
        &self,
        draft: &SpotDraft,
        actor: &Identity,
    ) -> RequestResult<WithId<PrayerSpot>> {
        draft.validate()?;

        let mut tx = self.database.transaction().await?;
        let base = draft.slug();
        let mut slug = base.clone();
        let mut suffix = 2;
        while tx.slug_taken(&slug).await? {
            slug = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        let new = draft.clone().into_new_spot(actor.user_id.clone(), slug);
        let created = tx.insert(new).await?;
        tx.commit().await?;

        info!(
            "created prayer spot '{}' at /{}",
            created.content.name, created.content.slug
        );
        Ok(created)
    }

    /// Marks a spot deleted. Only the creator or an admin may do this;
    /// deleting an already-deleted spot is a no-op success.
    pub async fn soft_delete(
        &self,
        id: &Id<PrayerSpot>,
        actor: &Identity,
    ) -> RequestResult<()> {
        self.moderate(id, actor, true).await
    }

    /// Clears the deletion mark again. Same authorization and idempotence
    /// rules as [`Client::soft_delete`].
    pub async fn restore(
        &self,
        id: &Id<PrayerSpot>,
        actor: &Identity,
    ) -> RequestResult<()> {
        self.moderate(id, actor, false).await
    }

    async fn moderate(
        &self,
        id: &Id<PrayerSpot>,
        actor: &Identity,
        deleted: bool,
    ) -> RequestResult<()> {
        let mut auto = self.database.auto();
        let spot = auto.get(id.clone()).await?;
        let profile = auto.get_profile(&actor.user_id).await?;
        let allowed = spot
            .content
            .moderated_by(&actor.user_id, profile.as_ref().map(|p| &p.content));
        if !allowed {
            return Err(RequestError::Forbidden);
        }
        auto.set_deleted(id, deleted).await?;
        info!(
            "{} prayer spot '{}'",
            if deleted { "deleted" } else { "restored" },
            spot.content.name
        );
        Ok(())
    }

    pub async fn profile(
        &self,
        id: &Id<Profile>,
    ) -> RequestResult<Option<WithId<Profile>>> {
        Ok(self.database.auto().get_profile(id).await?)
    }

    /// Makes sure a profile row exists for a signed-in user, creating an
    /// empty non-admin one on first sight. Spots reference profiles, so this
    /// runs when a session is established.
    pub async fn ensure_profile(
        &self,
        identity: &Identity,
    ) -> RequestResult<WithId<Profile>> {
        let mut auto = self.database.auto();
        if let Some(existing) = auto.get_profile(&identity.user_id).await? {
            return Ok(existing);
        }
        let created = auto
            .put_profile(WithId::new(
                identity.user_id.clone(),
                Profile {
                    display_name: None,
                    is_admin: false,
                },
            ))
            .await?;
        Ok(created)
    }

    pub async fn find_nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> RequestResult<Vec<WithDistance<WithId<PrayerSpot>>>> {
        let spots = self
            .database
            .auto()
            .find_nearby(latitude, longitude, radius_km)
            .await?;
        Ok(spots
            .into_iter()
            .map(|spot| {
                spot.content
                    .with_distance_to(latitude, longitude)
                    .with_id(spot.id)
            })
            .collect())
    }

    /// Attaches an image to a spot. The first image of a spot becomes its
    /// primary image.
    pub async fn add_image(
        &self,
        spot_id: &Id<PrayerSpot>,
        image_url: impl Into<String>,
        actor: &Identity,
    ) -> RequestResult<WithId<SpotImage>> {
        let mut tx = self.database.transaction().await?;
        // ensure the spot exists before attaching anything
        let _ = tx.get(spot_id.clone()).await?;
        let existing = tx.images_for_spot(spot_id).await?;
        let image = tx
            .insert_image(NewImage {
                spot_id: spot_id.clone(),
                image_url: image_url.into(),
                is_primary: existing.is_empty(),
            })
            .await?;
        tx.commit().await?;
        info!(
            "user {} attached an image to spot {}",
            actor.user_id, spot_id
        );
        Ok(image)
    }

    pub async fn images(
        &self,
        spot_id: &Id<PrayerSpot>,
    ) -> RequestResult<Vec<WithId<SpotImage>>> {
        Ok(self.database.auto().images_for_spot(spot_id).await?)
    }

    /// Switches the primary image of a spot. Creator or admin only.
    pub async fn set_primary_image(
        &self,
        spot_id: &Id<PrayerSpot>,
        image_id: &Id<SpotImage>,
        actor: &Identity,
    ) -> RequestResult<()> {
        let mut tx = self.database.transaction().await?;
        let spot = tx.get(spot_id.clone()).await?;
        let profile = tx.get_profile(&actor.user_id).await?;
        let allowed = spot
            .content
            .moderated_by(&actor.user_id, profile.as_ref().map(|p| &p.content));
        if !allowed {
            return Err(RequestError::Forbidden);
        }
        tx.set_primary_image(spot_id, image_id).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDatabase;
    use model::spot::DraftError;

    fn draft(name: &str, city: &str, country: &str) -> SpotDraft {
        SpotDraft {
            name: name.to_owned(),
            address: "1 Main St".to_owned(),
            latitude: 40.0,
            longitude: -73.0,
            city: city.to_owned(),
            country: country.to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_slug_creator_and_active_state() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        let created = client
            .create(&draft("Quiet Room", "NYC", "USA"), &actor)
            .await
            .unwrap();

        assert_eq!(created.content.slug, "usa/nyc/quiet-room");
        assert_eq!(created.content.created_by.raw(), "user-1");
        assert!(created.content.deleted_at.is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        client
            .create(&draft("First", "NYC", "USA"), &actor)
            .await
            .unwrap();
        client
            .create(&draft("Second", "NYC", "USA"), &actor)
            .await
            .unwrap();

        let listed = client.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content.name, "Second");
        assert_eq!(listed[1].content.name, "First");
    }

    #[tokio::test]
    async fn test_create_rejects_unset_location() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        let mut d = draft("Quiet Room", "NYC", "USA");
        d.latitude = 0.0;
        d.longitude = 0.0;

        match client.create(&d, &actor).await {
            Err(RequestError::Validation(DraftError::LocationUnset)) => {}
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_slug_collisions_get_suffixed() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        let first = client
            .create(&draft("Quiet Room", "NYC", "USA"), &actor)
            .await
            .unwrap();
        let second = client
            .create(&draft("Quiet Room", "NYC", "USA"), &actor)
            .await
            .unwrap();
        let third = client
            .create(&draft("Quiet Room", "NYC", "USA"), &actor)
            .await
            .unwrap();

        assert_eq!(first.content.slug, "usa/nyc/quiet-room");
        assert_eq!(second.content.slug, "usa/nyc/quiet-room-2");
        assert_eq!(third.content.slug, "usa/nyc/quiet-room-3");
    }

    #[tokio::test]
    async fn test_get_by_slug() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        client
            .create(&draft("Quiet Room", "NYC", "USA"), &actor)
            .await
            .unwrap();

        let found = client.get_by_slug("usa/nyc/quiet-room").await.unwrap();
        assert_eq!(found.unwrap().content.name, "Quiet Room");

        let missing = client.get_by_slug("usa/nyc/nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_is_idempotent_and_restorable() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        let created = client
            .create(&draft("Quiet Room", "NYC", "USA"), &actor)
            .await
            .unwrap();

        client.soft_delete(&created.id, &actor).await.unwrap();
        let after_first = client.list().await.unwrap()[0].content.deleted_at;
        assert!(after_first.is_some());

        // second delete keeps the original timestamp
        client.soft_delete(&created.id, &actor).await.unwrap();
        let after_second = client.list().await.unwrap()[0].content.deleted_at;
        assert_eq!(after_first, after_second);

        client.restore(&created.id, &actor).await.unwrap();
        let restored = client.list().await.unwrap()[0].content.deleted_at;
        assert!(restored.is_none());

        // restoring an active spot is a no-op success
        client.restore(&created.id, &actor).await.unwrap();
    }

    #[tokio::test]
    async fn test_deleted_spots_stay_listed() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        let created = client
            .create(&draft("Quiet Room", "NYC", "USA"), &actor)
            .await
            .unwrap();
        client.soft_delete(&created.id, &actor).await.unwrap();

        let listed = client.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].content.is_deleted());
    }

    #[tokio::test]
    async fn test_strangers_cannot_moderate() {
        let client = Client::new(MemoryDatabase::new());
        let owner = Identity::new("owner");
        let stranger = Identity::new("stranger");

        let created = client
            .create(&draft("Quiet Room", "NYC", "USA"), &owner)
            .await
            .unwrap();

        match client.soft_delete(&created.id, &stranger).await {
            Err(RequestError::Forbidden) => {}
            other => panic!("expected forbidden, got {:?}", other.err()),
        }
        assert!(!client.list().await.unwrap()[0].content.is_deleted());
    }

    #[tokio::test]
    async fn test_admins_can_moderate_any_spot() {
        let database = MemoryDatabase::new();
        database.put_profile_blocking(
            "admin",
            Profile {
                display_name: None,
                is_admin: true,
            },
        );
        let client = Client::new(database);
        let owner = Identity::new("owner");
        let admin = Identity::new("admin");

        let created = client
            .create(&draft("Quiet Room", "NYC", "USA"), &owner)
            .await
            .unwrap();

        client.soft_delete(&created.id, &admin).await.unwrap();
        assert!(client.list().await.unwrap()[0].content.is_deleted());
    }

    #[tokio::test]
    async fn test_ensure_profile_is_idempotent_and_keeps_the_admin_flag() {
        let database = MemoryDatabase::new();
        database.put_profile_blocking(
            "admin",
            Profile {
                display_name: None,
                is_admin: true,
            },
        );
        let client = Client::new(database);

        let admin = client.ensure_profile(&Identity::new("admin")).await.unwrap();
        assert!(admin.content.is_admin);

        let fresh = client
            .ensure_profile(&Identity::new("new-user"))
            .await
            .unwrap();
        assert!(!fresh.content.is_admin);
        let again = client
            .ensure_profile(&Identity::new("new-user"))
            .await
            .unwrap();
        assert!(!again.content.is_admin);
    }

    #[tokio::test]
    async fn test_moderating_a_missing_spot_is_not_found() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        let missing: Id<PrayerSpot> = Id::new("missing".to_owned());
        match client.soft_delete(&missing, &actor).await {
            Err(RequestError::NotFound) => {}
            other => panic!("expected not found, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_first_image_becomes_primary() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        let created = client
            .create(&draft("Quiet Room", "NYC", "USA"), &actor)
            .await
            .unwrap();

        let first = client
            .add_image(&created.id, "https://img.example/a.jpg", &actor)
            .await
            .unwrap();
        let second = client
            .add_image(&created.id, "https://img.example/b.jpg", &actor)
            .await
            .unwrap();

        assert!(first.content.is_primary);
        assert!(!second.content.is_primary);

        client
            .set_primary_image(&created.id, &second.id, &actor)
            .await
            .unwrap();
        let images = client.images(&created.id).await.unwrap();
        let primaries: Vec<_> =
            images.iter().filter(|i| i.content.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id, second.id);
    }

    #[tokio::test]
    async fn test_find_nearby_annotates_distance() {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");

        client
            .create(&draft("Close", "NYC", "USA"), &actor)
            .await
            .unwrap();
        let mut far = draft("Far", "NYC", "USA");
        far.latitude = 41.5;
        client.create(&far, &actor).await.unwrap();

        let nearby = client.find_nearby(40.0, -73.0, 10.0).await.unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].content.content.name, "Close");
        assert!(nearby[0].distance_km < 1.0);
    }
}
