//! RecipeRepository - Repository per i CSV di ricette da embeddare

use super::{Create, Read};
use crate::entities::Recipe;
use sqlx::{Error, MySqlPool};

pub struct RecipeRepository {
    connection_pool: MySqlPool,
}

impl RecipeRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Recipe>, Error> {
        let recipes = sqlx::query_as!(
            Recipe,
            r#"
            SELECT recipe_id, csv_path, is_embedded as "is_embedded: bool", uploaded_at
            FROM recipes
            ORDER BY recipe_id ASC
            "#
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(recipes)
    }

    /// Ricette non ancora indicizzate nel vector store
    pub async fn find_unembedded(&self) -> Result<Vec<Recipe>, Error> {
        let recipes = sqlx::query_as!(
            Recipe,
            r#"
            SELECT recipe_id, csv_path, is_embedded as "is_embedded: bool", uploaded_at
            FROM recipes
            WHERE is_embedded = FALSE
            ORDER BY recipe_id ASC
            "#
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(recipes)
    }

    pub async fn mark_embedded(&self, recipe_id: &i32) -> Result<(), Error> {
        sqlx::query!(
            "UPDATE recipes SET is_embedded = TRUE WHERE recipe_id = ?",
            recipe_id
        )
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }
}

impl Create<Recipe, String> for RecipeRepository {
    /// Il DTO di creazione è il path del CSV appena salvato su disco
    async fn create(&self, csv_path: &String) -> Result<Recipe, Error> {
        let result = sqlx::query!("INSERT INTO recipes (csv_path) VALUES (?)", csv_path)
            .execute(&self.connection_pool)
            .await?;

        let new_id = result.last_insert_id() as i32;

        self.read(&new_id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Read<Recipe, i32> for RecipeRepository {
    async fn read(&self, id: &i32) -> Result<Option<Recipe>, Error> {
        let recipe = sqlx::query_as!(
            Recipe,
            r#"
            SELECT recipe_id, csv_path, is_embedded as "is_embedded: bool", uploaded_at
            FROM recipes WHERE recipe_id = ?
            "#,
            id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {

    use sqlx::MySqlPool;

    use super::*;
    use crate::repositories::Create;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "recipes")))]
    async fn test_unembedded_filter(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = RecipeRepository::new(pool);

        // la fixture è già embedded
        assert!(repo.find_unembedded().await?.is_empty());

        let created = repo.create(&"media/csv_file/new.csv".to_string()).await?;
        assert!(!created.is_embedded);

        let pending = repo.find_unembedded().await?;
        assert_eq!(pending.len(), 1);

        repo.mark_embedded(&created.recipe_id).await?;
        assert!(repo.find_unembedded().await?.is_empty());

        Ok(())
    }
}
