use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    image::{NewImage, SpotImage},
    spot::PrayerSpot,
    WithId,
};
use prayer_spots::database::{ImageRepo, Result};
use sqlx::prelude::FromRow;
use utility::id::Id;

use crate::{
    queries::image::{clear_primary, get_for_spot, insert, mark_primary},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct ImageRow {
    pub id: String,
    pub spot_id: String,
    pub image_url: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl DatabaseRow for ImageRow {
    type Model = SpotImage;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Self::Model {
        SpotImage {
            spot_id: Id::new(self.spot_id),
            image_url: self.image_url,
            is_primary: self.is_primary,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl ImageRepo for PgDatabaseAutocommit {
    async fn images_for_spot(
        &mut self,
        spot_id: &Id<PrayerSpot>,
    ) -> Result<Vec<WithId<SpotImage>>> {
        get_for_spot(&self.pool, spot_id).await
    }

    async fn insert_image(&mut self, image: NewImage) -> Result<WithId<SpotImage>> {
        insert(&self.pool, image).await
    }

    async fn set_primary_image(
        &mut self,
        spot_id: &Id<PrayerSpot>,
        image_id: &Id<SpotImage>,
    ) -> Result<()> {
        clear_primary(&self.pool, spot_id).await?;
        mark_primary(&self.pool, spot_id, image_id).await
    }
}

#[async_trait]
impl<'a> ImageRepo for PgDatabaseTransaction<'a> {
    async fn images_for_spot(
        &mut self,
        spot_id: &Id<PrayerSpot>,
    ) -> Result<Vec<WithId<SpotImage>>> {
        get_for_spot(&mut *self.tx, spot_id).await
    }

    async fn insert_image(&mut self, image: NewImage) -> Result<WithId<SpotImage>> {
        insert(&mut *self.tx, image).await
    }

    async fn set_primary_image(
        &mut self,
        spot_id: &Id<PrayerSpot>,
        image_id: &Id<SpotImage>,
    ) -> Result<()> {
        clear_primary(&mut *self.tx, spot_id).await?;
        mark_primary(&mut *self.tx, spot_id, image_id).await
    }
}
