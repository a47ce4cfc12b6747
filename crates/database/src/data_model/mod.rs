use std::fmt::Debug;

use model::WithId;
use serde::Serialize;
use utility::id::{HasId, Id};

pub mod image;
pub mod profile;
pub mod spot;

/// Connects a sqlx row type to the model type it maps to.
pub trait DatabaseRow {
    type Model: Serialize + HasId;

    fn get_id(&self) -> Id<Self::Model>;
    fn to_model(self) -> Self::Model;
}

pub fn with_id<R: DatabaseRow>(row: R) -> WithId<R::Model>
where
    <R::Model as HasId>::IdType: Debug + Clone + Serialize,
{
    WithId::new(row.get_id(), row.to_model())
}

pub fn with_ids<R: DatabaseRow>(rows: Vec<R>) -> Vec<WithId<R::Model>>
where
    <R::Model as HasId>::IdType: Debug + Clone + Serialize,
{
    rows.into_iter().map(|row| with_id(row)).collect::<Vec<_>>()
}
