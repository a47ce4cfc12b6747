use std::{env, error::Error};

use async_trait::async_trait;
use prayer_spots::database::{
    Database, DatabaseAutocommit, DatabaseError, DatabaseOperations,
    DatabaseTransaction,
};
use queries::convert_error;
use sqlx::Transaction;

pub mod data_model;
pub mod queries;

pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
        })
    }

    pub(self) fn postgres_url(self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

#[derive(Clone)]
pub struct PgDatabase {
    connection: sqlx::PgPool,
}

pub struct PgDatabaseTransaction<'a> {
    tx: Transaction<'a, sqlx::Postgres>,
}

#[async_trait]
impl<'a> DatabaseTransaction for PgDatabaseTransaction<'a> {
    async fn commit(self) -> prayer_spots::database::Result<()> {
        self.tx.commit().await.map_err(|why| match why {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            _ => DatabaseError::Other(Box::new(why)),
        })
    }
}

pub struct PgDatabaseAutocommit {
    pool: sqlx::PgPool,
}

impl DatabaseAutocommit for PgDatabaseAutocommit {}

impl DatabaseOperations for PgDatabaseAutocommit {}

impl<'a> DatabaseOperations for PgDatabaseTransaction<'a> {}

impl PgDatabase {
    pub async fn connect(
        database_connection_info: DatabaseConnectionInfo,
    ) -> Result<Self, Box<dyn Error>> {
        let url = database_connection_info.postgres_url();
        let pool = sqlx::postgres::PgPool::connect(&url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { connection: pool })
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Transaction = PgDatabaseTransaction<'static>;
    type Autocommit = PgDatabaseAutocommit;

    fn auto(&self) -> Self::Autocommit {
        PgDatabaseAutocommit {
            pool: self.connection.clone(),
        }
    }

    async fn transaction(
        &self,
    ) -> prayer_spots::database::Result<Self::Transaction> {
        let tx: Transaction<'_, sqlx::Postgres> = self
            .connection
            .begin()
            .await
            .map_err(convert_error)?;

        Ok(PgDatabaseTransaction { tx })
    }
}
