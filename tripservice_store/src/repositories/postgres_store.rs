use anyhow::Context;
use serde_json::json;
use tokio_postgres::{Client, NoTls, Statement};

use crate::api::{Destination, ItemId, NewDestination, Review, UserDetails, UserId};
use crate::repositories::{
    DestinationsRepository, InteractionsRepository, StoreError, UsersRepository,
};

pub struct PostgresStore {
    client: Client,
}

pub struct PostgresStoreConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

impl PostgresStore {
    pub async fn init(config: PostgresStoreConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}",
            config.username, config.password, config.hostname
        );
        tracing::info!("Postgres connection_str: {}", connection_str);
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("connection error: {}", e);
            }
        });

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS users (
            id              SERIAL PRIMARY KEY,
            params          JSONB
            );
        CREATE TABLE IF NOT EXISTS reviews (
            user_id         INT NOT NULL,
            item_id         INT NOT NULL,
            rating          INT NOT NULL
            );
        CREATE TABLE IF NOT EXISTS bookmarks (
            user_id         INT NOT NULL,
            item_id         INT NOT NULL
            );
        CREATE TABLE IF NOT EXISTS likes (
            user_id         INT NOT NULL,
            item_id         INT NOT NULL
            );
        CREATE TABLE IF NOT EXISTS destinations (
            item_id         SERIAL PRIMARY KEY,
            place_name      TEXT NOT NULL,
            category        TEXT NOT NULL,
            city            TEXT NOT NULL,
            rating_avg      DOUBLE PRECISION NOT NULL,
            description     TEXT NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup tables")?;
        Ok(Self { client })
    }

    pub async fn add_user(&self, details: UserDetails) -> Result<UserId, StoreError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO users (params) VALUES ($1) RETURNING id")
            .await?;

        let rows = self.client.query(&stmt, &[&json!(details)]).await?;

        let user_id: UserId = rows
            .first()
            .ok_or_else(|| StoreError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(user_id)
    }

    pub async fn add_destination(&self, details: NewDestination) -> Result<ItemId, StoreError> {
        let stmt: Statement = self
            .client
            .prepare(
                "INSERT INTO destinations (place_name, category, city, rating_avg, description) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING item_id",
            )
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &details.place_name,
                    &details.category,
                    &details.city,
                    &details.rating_avg,
                    &details.description,
                ],
            )
            .await?;

        let item_id: ItemId = rows
            .first()
            .ok_or_else(|| StoreError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(item_id)
    }

    pub async fn add_review(
        &self,
        user_id: UserId,
        item_id: ItemId,
        rating: i32,
    ) -> Result<(), StoreError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO reviews (user_id, item_id, rating) VALUES ($1, $2, $3)")
            .await?;
        self.client
            .execute(&stmt, &[&user_id, &item_id, &rating])
            .await?;
        Ok(())
    }

    pub async fn add_bookmark(&self, user_id: UserId, item_id: ItemId) -> Result<(), StoreError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO bookmarks (user_id, item_id) VALUES ($1, $2)")
            .await?;
        self.client.execute(&stmt, &[&user_id, &item_id]).await?;
        Ok(())
    }

    pub async fn add_like(&self, user_id: UserId, item_id: ItemId) -> Result<(), StoreError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO likes (user_id, item_id) VALUES ($1, $2)")
            .await?;
        self.client.execute(&stmt, &[&user_id, &item_id]).await?;
        Ok(())
    }
}

fn destination_from_row(row: &tokio_postgres::Row) -> Result<Destination, StoreError> {
    Ok(Destination {
        item_id: row.try_get(0)?,
        place_name: row.try_get(1)?,
        category: row.try_get(2)?,
        city: row.try_get(3)?,
        rating_avg: row.try_get(4)?,
        description: row.try_get(5)?,
    })
}

#[async_trait::async_trait]
impl UsersRepository for PostgresStore {
    async fn get_user(&self, user_id: UserId) -> Result<Option<UserDetails>, StoreError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT params FROM users WHERE id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&user_id]).await?;

        match rows.first() {
            Some(row) => {
                let params: serde_json::Value = row.try_get(0)?;
                Ok(Some(serde_json::from_value(params)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl InteractionsRepository for PostgresStore {
    async fn reviews_for_user(&self, user_id: UserId) -> Result<Vec<Review>, StoreError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT item_id, rating FROM reviews WHERE user_id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&user_id]).await?;

        rows.iter()
            .map(|row| {
                Ok(Review {
                    item_id: row.try_get(0)?,
                    rating: row.try_get(1)?,
                })
            })
            .collect()
    }

    async fn bookmarks_for_user(&self, user_id: UserId) -> Result<Vec<ItemId>, StoreError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT item_id FROM bookmarks WHERE user_id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&user_id]).await?;

        rows.iter().map(|row| Ok(row.try_get(0)?)).collect()
    }

    async fn likes_for_user(&self, user_id: UserId) -> Result<Vec<ItemId>, StoreError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT item_id FROM likes WHERE user_id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&user_id]).await?;

        rows.iter().map(|row| Ok(row.try_get(0)?)).collect()
    }
}

#[async_trait::async_trait]
impl DestinationsRepository for PostgresStore {
    async fn find_by_place_names(
        &self,
        place_names: &[String],
    ) -> Result<Vec<Destination>, StoreError> {
        if place_names.is_empty() {
            return Ok(vec![]);
        }
        let stmt: Statement = self
            .client
            .prepare(
                "SELECT item_id, place_name, category, city, rating_avg, description \
                 FROM destinations WHERE place_name = ANY($1)",
            )
            .await?;

        let rows = self.client.query(&stmt, &[&place_names]).await?;

        rows.iter().map(destination_from_row).collect()
    }

    async fn find_by_item_ids(&self, item_ids: &[ItemId]) -> Result<Vec<Destination>, StoreError> {
        if item_ids.is_empty() {
            return Ok(vec![]);
        }
        let stmt: Statement = self
            .client
            .prepare(
                "SELECT item_id, place_name, category, city, rating_avg, description \
                 FROM destinations WHERE item_id = ANY($1)",
            )
            .await?;

        let rows = self.client.query(&stmt, &[&item_ids]).await?;

        rows.iter().map(destination_from_row).collect()
    }
}
