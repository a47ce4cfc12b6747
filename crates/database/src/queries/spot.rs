use model::{
    spot::{NewSpot, PrayerSpot},
    WithId,
};
use prayer_spots::database::Result;
use sqlx::{Executor, Postgres};
use utility::{
    geo::{self, EARTH_RADIUS_KM},
    id::Id,
    let_also::LetAlso,
};

use crate::data_model::{spot::SpotRow, with_id, with_ids};

use super::convert_error;

pub async fn get<'c, E>(executor: E, id: Id<PrayerSpot>) -> Result<WithId<PrayerSpot>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, name, description, address, latitude, longitude,
            city, country, slug, created_by, created_at, deleted_at
        FROM
            prayer_spots
        WHERE id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map(|row: SpotRow| with_id(row))
    .map_err(convert_error)
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<PrayerSpot>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, name, description, address, latitude, longitude,
            city, country, slug, created_by, created_at, deleted_at
        FROM
            prayer_spots
        ORDER BY created_at DESC;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|spots: Vec<SpotRow>| Ok(with_ids(spots)))
}

pub async fn get_by_slug<'c, E>(
    executor: E,
    slug: &str,
) -> Result<Option<WithId<PrayerSpot>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, name, description, address, latitude, longitude,
            city, country, slug, created_by, created_at, deleted_at
        FROM
            prayer_spots
        WHERE slug = $1;
        ",
    )
    .bind(slug)
    .fetch_optional(executor)
    .await
    .map(|row| row.map(|row: SpotRow| with_id(row)))
    .map_err(convert_error)
}

pub async fn slug_taken<'c, E>(executor: E, slug: &str) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM prayer_spots WHERE slug = $1);",
    )
    .bind(slug)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
}

pub async fn insert<'c, E>(executor: E, spot: NewSpot) -> Result<WithId<PrayerSpot>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO prayer_spots(
            name,
            description,
            address,
            latitude,
            longitude,
            city,
            country,
            slug,
            created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING
            id, name, description, address, latitude, longitude,
            city, country, slug, created_by, created_at, deleted_at;
        ",
    )
    .bind(&spot.name)
    .bind(&spot.description)
    .bind(&spot.address)
    .bind(spot.latitude)
    .bind(spot.longitude)
    .bind(&spot.city)
    .bind(&spot.country)
    .bind(&spot.slug)
    .bind(spot.created_by.raw())
    .fetch_one(executor)
    .await
    .map(|row: SpotRow| with_id(row))
    .map_err(convert_error)
}

/// Deletion keeps the first timestamp, so repeating the call cannot move it.
pub async fn set_deleted<'c, E>(
    executor: E,
    id: &Id<PrayerSpot>,
    deleted: bool,
) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let query = if deleted {
        "
        UPDATE prayer_spots
        SET deleted_at = COALESCE(deleted_at, now())
        WHERE id = $1
        RETURNING id;
        "
    } else {
        "
        UPDATE prayer_spots
        SET deleted_at = NULL
        WHERE id = $1
        RETURNING id;
        "
    };
    sqlx::query_scalar::<_, String>(query)
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map(|_| ())
        .map_err(convert_error)
}

pub async fn get_nearby<'c, E>(
    executor: E,
    center_latitude: f64,
    center_longitude: f64,
    radius_km: f64,
) -> Result<Vec<WithId<PrayerSpot>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let ((min_lat, min_lon), (max_lat, max_lon)) =
        geo::calculate_bounding_box(center_latitude, center_longitude, radius_km);

    sqlx::query_as(
        "
        WITH distance_calc AS (
            SELECT
                id,
                ($1 * ACOS(
                    COS(RADIANS($2)) * COS(RADIANS(latitude)) *
                    COS(RADIANS(longitude) - RADIANS($3)) +
                    SIN(RADIANS($2)) * SIN(RADIANS(latitude))
                )) AS distance
            FROM
                prayer_spots
            WHERE
                latitude BETWEEN $4 AND $5
                AND longitude BETWEEN $6 AND $7
        )
        SELECT
            id, name, description, address, latitude, longitude,
            city, country, slug, created_by, created_at, deleted_at
        FROM
            prayer_spots
        WHERE
            id IN (
                SELECT id FROM distance_calc WHERE distance < $8
            );
        ",
    )
    .bind(EARTH_RADIUS_KM)
    .bind(center_latitude)
    .bind(center_longitude)
    .bind(min_lat)
    .bind(max_lat)
    .bind(min_lon)
    .bind(max_lon)
    .bind(radius_km)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|spots: Vec<SpotRow>| Ok(with_ids(spots)))
}
