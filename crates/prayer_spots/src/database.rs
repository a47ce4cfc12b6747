use std::{error, result};

use async_trait::async_trait;
use model::{
    image::{NewImage, SpotImage},
    profile::Profile,
    spot::{NewSpot, PrayerSpot},
    WithId,
};
use utility::id::Id;

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    Other(Box<dyn error::Error + Send + Sync>),
}

pub type Result<T> = result::Result<T, DatabaseError>;

#[async_trait]
pub trait SpotRepo {
    async fn get(&mut self, id: Id<PrayerSpot>) -> Result<WithId<PrayerSpot>>;

    /// All spots, soft-deleted ones included, newest first.
    async fn get_all(&mut self) -> Result<Vec<WithId<PrayerSpot>>>;

    async fn get_by_slug(&mut self, slug: &str)
        -> Result<Option<WithId<PrayerSpot>>>;

    async fn slug_taken(&mut self, slug: &str) -> Result<bool>;

    async fn insert(&mut self, spot: NewSpot) -> Result<WithId<PrayerSpot>>;

    /// Marks a spot deleted or active. Idempotent: re-deleting keeps the
    /// original deletion timestamp, re-restoring is a no-op.
    async fn set_deleted(
        &mut self,
        id: &Id<PrayerSpot>,
        deleted: bool,
    ) -> Result<()>;

    async fn find_nearby(
        &mut self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<WithId<PrayerSpot>>>;
}

#[async_trait]
pub trait ProfileRepo {
    async fn get_profile(
        &mut self,
        id: &Id<Profile>,
    ) -> Result<Option<WithId<Profile>>>;

    async fn put_profile(
        &mut self,
        profile: WithId<Profile>,
    ) -> Result<WithId<Profile>>;
}

#[async_trait]
pub trait ImageRepo {
    /// Images of a spot, oldest first.
    async fn images_for_spot(
        &mut self,
        spot_id: &Id<PrayerSpot>,
    ) -> Result<Vec<WithId<SpotImage>>>;

    async fn insert_image(&mut self, image: NewImage) -> Result<WithId<SpotImage>>;

    /// Makes `image_id` the primary image of `spot_id`, clearing any other
    /// primary flag of that spot.
    async fn set_primary_image(
        &mut self,
        spot_id: &Id<PrayerSpot>,
        image_id: &Id<SpotImage>,
    ) -> Result<()>;
}

pub trait DatabaseOperations: SpotRepo + ProfileRepo + ImageRepo {}

#[async_trait]
pub trait DatabaseTransaction: DatabaseOperations {
    async fn commit(self) -> Result<()>;
}

pub trait DatabaseAutocommit: DatabaseOperations {}

/// Trait to implement the spot store. Multiple concurrent accesses should be
/// possible by e.g. cloning the database object.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized {
    type Transaction: DatabaseTransaction + Send;
    type Autocommit: DatabaseAutocommit + Send;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;
}
