use model::{
    image::{NewImage, SpotImage},
    spot::PrayerSpot,
    WithId,
};
use prayer_spots::database::Result;
use sqlx::{Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};

use crate::data_model::{image::ImageRow, with_id, with_ids};

use super::convert_error;

pub async fn get_for_spot<'c, E>(
    executor: E,
    spot_id: &Id<PrayerSpot>,
) -> Result<Vec<WithId<SpotImage>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, spot_id, image_url, is_primary, created_at
        FROM
            prayer_spot_images
        WHERE spot_id = $1
        ORDER BY created_at ASC, id ASC;
        ",
    )
    .bind(spot_id.raw())
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|images: Vec<ImageRow>| Ok(with_ids(images)))
}

pub async fn insert<'c, E>(executor: E, image: NewImage) -> Result<WithId<SpotImage>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO prayer_spot_images(spot_id, image_url, is_primary)
        VALUES ($1, $2, $3)
        RETURNING id, spot_id, image_url, is_primary, created_at;
        ",
    )
    .bind(image.spot_id.raw())
    .bind(&image.image_url)
    .bind(image.is_primary)
    .fetch_one(executor)
    .await
    .map(|row: ImageRow| with_id(row))
    .map_err(convert_error)
}

pub async fn clear_primary<'c, E>(executor: E, spot_id: &Id<PrayerSpot>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("UPDATE prayer_spot_images SET is_primary = FALSE WHERE spot_id = $1;")
        .bind(spot_id.raw())
        .execute(executor)
        .await
        .map(|_| ())
        .map_err(convert_error)
}

pub async fn mark_primary<'c, E>(
    executor: E,
    spot_id: &Id<PrayerSpot>,
    image_id: &Id<SpotImage>,
) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar::<_, String>(
        "
        UPDATE prayer_spot_images
        SET is_primary = TRUE
        WHERE id = $1 AND spot_id = $2
        RETURNING id;
        ",
    )
    .bind(image_id.raw())
    .bind(spot_id.raw())
    .fetch_one(executor)
    .await
    .map(|_| ())
    .map_err(convert_error)
}
