use async_trait::async_trait;
use model::{profile::Profile, WithId};
use prayer_spots::database::{ProfileRepo, Result};
use sqlx::prelude::FromRow;
use utility::id::Id;

use crate::{
    queries::profile::{get, put},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
}

impl DatabaseRow for ProfileRow {
    type Model = Profile;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Self::Model {
        Profile {
            display_name: self.display_name,
            is_admin: self.is_admin,
        }
    }
}

#[async_trait]
impl ProfileRepo for PgDatabaseAutocommit {
    async fn get_profile(
        &mut self,
        id: &Id<Profile>,
    ) -> Result<Option<WithId<Profile>>> {
        get(&self.pool, id).await
    }

    async fn put_profile(
        &mut self,
        profile: WithId<Profile>,
    ) -> Result<WithId<Profile>> {
        put(&self.pool, profile).await
    }
}

#[async_trait]
impl<'a> ProfileRepo for PgDatabaseTransaction<'a> {
    async fn get_profile(
        &mut self,
        id: &Id<Profile>,
    ) -> Result<Option<WithId<Profile>>> {
        get(&mut *self.tx, id).await
    }

    async fn put_profile(
        &mut self,
        profile: WithId<Profile>,
    ) -> Result<WithId<Profile>> {
        put(&mut *self.tx, profile).await
    }
}
