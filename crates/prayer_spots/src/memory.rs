//! In-memory store used by the unit tests. Mirrors the Postgres schema rules
//! (unique slug, zero-coordinate check, first-wins deletion timestamp) so the
//! client behaves the same against either backend. Writes apply immediately;
//! the transaction type exists to satisfy the trait family, which is enough
//! for these tests.

use std::{
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use model::{
    image::{NewImage, SpotImage},
    profile::Profile,
    spot::{NewSpot, PrayerSpot},
    WithId,
};
use utility::{geo::haversine_distance, id::Id};

use crate::database::{
    Database, DatabaseAutocommit, DatabaseError, DatabaseOperations,
    DatabaseTransaction, ImageRepo, ProfileRepo, Result, SpotRepo,
};

#[derive(Default)]
struct MemoryState {
    spots: Vec<WithId<PrayerSpot>>,
    profiles: Vec<WithId<Profile>>,
    images: Vec<WithId<SpotImage>>,
    sequence: i64,
    fail_requests: bool,
}

impl MemoryState {
    fn next_id(&mut self) -> (String, DateTime<Utc>) {
        self.sequence += 1;
        let id = format!("record-{}", self.sequence);
        // strictly increasing timestamps keep the newest-first order testable
        let created_at = Utc
            .timestamp_opt(self.sequence, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        (id, created_at)
    }

    fn check_available(&self) -> Result<()> {
        if self.fail_requests {
            Err(DatabaseError::Other(Box::new(io::Error::new(
                io::ErrorKind::Other,
                "simulated outage",
            ))))
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a profile without going through the async trait family.
    pub fn put_profile_blocking(&self, user_id: &str, profile: Profile) {
        let mut state = self.state.lock().unwrap();
        state
            .profiles
            .push(WithId::new(Id::new(user_id.to_owned()), profile));
    }

    /// Makes every following request fail, simulating a store outage.
    pub fn set_fail_requests(&self, fail: bool) {
        self.state.lock().unwrap().fail_requests = fail;
    }
}

pub(crate) struct MemoryHandle {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl SpotRepo for MemoryHandle {
    async fn get(&mut self, id: Id<PrayerSpot>) -> Result<WithId<PrayerSpot>> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        state
            .spots
            .iter()
            .find(|spot| spot.id == id)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn get_all(&mut self) -> Result<Vec<WithId<PrayerSpot>>> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        let mut spots = state.spots.clone();
        spots.sort_by(|a, b| b.content.created_at.cmp(&a.content.created_at));
        Ok(spots)
    }

    async fn get_by_slug(
        &mut self,
        slug: &str,
    ) -> Result<Option<WithId<PrayerSpot>>> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        Ok(state
            .spots
            .iter()
            .find(|spot| spot.content.slug == slug)
            .cloned())
    }

    async fn slug_taken(&mut self, slug: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        Ok(state.spots.iter().any(|spot| spot.content.slug == slug))
    }

    async fn insert(&mut self, spot: NewSpot) -> Result<WithId<PrayerSpot>> {
        let mut state = self.state.lock().unwrap();
        state.check_available()?;
        if spot.latitude == 0.0 && spot.longitude == 0.0 {
            return Err(DatabaseError::Other(Box::new(io::Error::new(
                io::ErrorKind::InvalidInput,
                "check constraint: coordinates are unset",
            ))));
        }
        if state.spots.iter().any(|s| s.content.slug == spot.slug) {
            return Err(DatabaseError::Other(Box::new(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "unique constraint: slug taken",
            ))));
        }
        let (id, created_at) = state.next_id();
        let stored = WithId::new(
            Id::new(id),
            PrayerSpot {
                name: spot.name,
                description: spot.description,
                address: spot.address,
                latitude: spot.latitude,
                longitude: spot.longitude,
                city: spot.city,
                country: spot.country,
                slug: spot.slug,
                created_by: spot.created_by,
                created_at,
                deleted_at: None,
            },
        );
        state.spots.push(stored.clone());
        Ok(stored)
    }

    async fn set_deleted(
        &mut self,
        id: &Id<PrayerSpot>,
        deleted: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_available()?;
        let now = Utc::now();
        let spot = state
            .spots
            .iter_mut()
            .find(|spot| spot.id == *id)
            .ok_or(DatabaseError::NotFound)?;
        if deleted {
            // first deletion timestamp wins, like COALESCE in the SQL store
            spot.content.deleted_at = spot.content.deleted_at.or(Some(now));
        } else {
            spot.content.deleted_at = None;
        }
        Ok(())
    }

    async fn find_nearby(
        &mut self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<WithId<PrayerSpot>>> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        Ok(state
            .spots
            .iter()
            .filter(|spot| {
                haversine_distance(
                    latitude,
                    longitude,
                    spot.content.latitude,
                    spot.content.longitude,
                ) < radius_km
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileRepo for MemoryHandle {
    async fn get_profile(
        &mut self,
        id: &Id<Profile>,
    ) -> Result<Option<WithId<Profile>>> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        Ok(state
            .profiles
            .iter()
            .find(|profile| profile.id == *id)
            .cloned())
    }

    async fn put_profile(
        &mut self,
        profile: WithId<Profile>,
    ) -> Result<WithId<Profile>> {
        let mut state = self.state.lock().unwrap();
        state.check_available()?;
        state.profiles.retain(|existing| existing.id != profile.id);
        state.profiles.push(profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl ImageRepo for MemoryHandle {
    async fn images_for_spot(
        &mut self,
        spot_id: &Id<PrayerSpot>,
    ) -> Result<Vec<WithId<SpotImage>>> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        Ok(state
            .images
            .iter()
            .filter(|image| image.content.spot_id == *spot_id)
            .cloned()
            .collect())
    }

    async fn insert_image(&mut self, image: NewImage) -> Result<WithId<SpotImage>> {
        let mut state = self.state.lock().unwrap();
        state.check_available()?;
        let (id, created_at) = state.next_id();
        let stored = WithId::new(
            Id::new(id),
            SpotImage {
                spot_id: image.spot_id,
                image_url: image.image_url,
                is_primary: image.is_primary,
                created_at,
            },
        );
        state.images.push(stored.clone());
        Ok(stored)
    }

    async fn set_primary_image(
        &mut self,
        spot_id: &Id<PrayerSpot>,
        image_id: &Id<SpotImage>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_available()?;
        let mut found = false;
        for image in state
            .images
            .iter_mut()
            .filter(|image| image.content.spot_id == *spot_id)
        {
            image.content.is_primary = image.id == *image_id;
            found = found || image.content.is_primary;
        }
        if found {
            Ok(())
        } else {
            Err(DatabaseError::NotFound)
        }
    }
}

impl DatabaseOperations for MemoryHandle {}

#[async_trait]
impl DatabaseTransaction for MemoryHandle {
    async fn commit(self) -> Result<()> {
        Ok(())
    }
}

impl DatabaseAutocommit for MemoryHandle {}

#[async_trait]
impl Database for MemoryDatabase {
    type Transaction = MemoryHandle;
    type Autocommit = MemoryHandle;

    async fn transaction(&self) -> Result<Self::Transaction> {
        Ok(MemoryHandle {
            state: self.state.clone(),
        })
    }

    fn auto(&self) -> Self::Autocommit {
        MemoryHandle {
            state: self.state.clone(),
        }
    }
}
