use model::{profile::Profile, WithId};
use prayer_spots::database::Result;
use sqlx::{Executor, Postgres};
use utility::id::Id;

use crate::data_model::{profile::ProfileRow, with_id};

use super::convert_error;

pub async fn get<'c, E>(
    executor: E,
    id: &Id<Profile>,
) -> Result<Option<WithId<Profile>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, display_name, is_admin
        FROM
            profiles
        WHERE id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_optional(executor)
    .await
    .map(|row| row.map(|row: ProfileRow| with_id(row)))
    .map_err(convert_error)
}

pub async fn put<'c, E>(
    executor: E,
    profile: WithId<Profile>,
) -> Result<WithId<Profile>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO profiles(id, display_name, is_admin)
        VALUES ($1, $2, $3)
        ON CONFLICT (id)
        DO UPDATE SET
            display_name = EXCLUDED.display_name,
            is_admin = EXCLUDED.is_admin
        RETURNING id, display_name, is_admin;
        ",
    )
    .bind(profile.id.raw())
    .bind(&profile.content.display_name)
    .bind(profile.content.is_admin)
    .fetch_one(executor)
    .await
    .map(|row: ProfileRow| with_id(row))
    .map_err(convert_error)
}
