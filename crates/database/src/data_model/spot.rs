use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    spot::{NewSpot, PrayerSpot},
    WithId,
};
use prayer_spots::database::{Result, SpotRepo};
use sqlx::prelude::FromRow;
use utility::id::Id;

use crate::{
    queries::spot::{
        get, get_all, get_by_slug, get_nearby, insert, set_deleted, slug_taken,
    },
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct SpotRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
    pub slug: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DatabaseRow for SpotRow {
    type Model = PrayerSpot;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Self::Model {
        PrayerSpot {
            name: self.name,
            description: self.description,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            city: self.city,
            country: self.country,
            slug: self.slug,
            created_by: Id::new(self.created_by),
            created_at: self.created_at,
            deleted_at: self.deleted_at,
        }
    }
}

#[async_trait]
impl SpotRepo for PgDatabaseAutocommit {
    async fn get(&mut self, id: Id<PrayerSpot>) -> Result<WithId<PrayerSpot>> {
        get(&self.pool, id).await
    }

    async fn get_all(&mut self) -> Result<Vec<WithId<PrayerSpot>>> {
        get_all(&self.pool).await
    }

    async fn get_by_slug(
        &mut self,
        slug: &str,
    ) -> Result<Option<WithId<PrayerSpot>>> {
        get_by_slug(&self.pool, slug).await
    }

    async fn slug_taken(&mut self, slug: &str) -> Result<bool> {
        slug_taken(&self.pool, slug).await
    }

    async fn insert(&mut self, spot: NewSpot) -> Result<WithId<PrayerSpot>> {
        insert(&self.pool, spot).await
    }

    async fn set_deleted(
        &mut self,
        id: &Id<PrayerSpot>,
        deleted: bool,
    ) -> Result<()> {
        set_deleted(&self.pool, id, deleted).await
    }

    async fn find_nearby(
        &mut self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<WithId<PrayerSpot>>> {
        get_nearby(&self.pool, latitude, longitude, radius_km).await
    }
}

#[async_trait]
impl<'a> SpotRepo for PgDatabaseTransaction<'a> {
    async fn get(&mut self, id: Id<PrayerSpot>) -> Result<WithId<PrayerSpot>> {
        get(&mut *self.tx, id).await
    }

    async fn get_all(&mut self) -> Result<Vec<WithId<PrayerSpot>>> {
        get_all(&mut *self.tx).await
    }

    async fn get_by_slug(
        &mut self,
        slug: &str,
    ) -> Result<Option<WithId<PrayerSpot>>> {
        get_by_slug(&mut *self.tx, slug).await
    }

    async fn slug_taken(&mut self, slug: &str) -> Result<bool> {
        slug_taken(&mut *self.tx, slug).await
    }

    async fn insert(&mut self, spot: NewSpot) -> Result<WithId<PrayerSpot>> {
        insert(&mut *self.tx, spot).await
    }

    async fn set_deleted(
        &mut self,
        id: &Id<PrayerSpot>,
        deleted: bool,
    ) -> Result<()> {
        set_deleted(&mut *self.tx, id, deleted).await
    }

    async fn find_nearby(
        &mut self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<WithId<PrayerSpot>>> {
        get_nearby(&mut *self.tx, latitude, longitude, radius_km).await
    }
}
