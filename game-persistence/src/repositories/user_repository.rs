use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::store_error;
use crate::entities::{prelude::*, users};
use game_core::{PlayerDirectory, StoreError};
use game_types::User;

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_user(model: users::Model) -> User {
        User {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            created_at: model.created_at.to_rfc3339(),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user_model = Users::find_by_id(id).one(&self.db).await?;
        Ok(user_model.map(Self::model_to_user))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user_model = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(user_model.map(Self::model_to_user))
    }

    pub async fn create_user(&self, user: User) -> Result<User> {
        let now = chrono::Utc::now().into();
        let created_at = chrono::DateTime::parse_from_rfc3339(&user.created_at)
            .unwrap_or_else(|_| chrono::Utc::now().into());

        let user_model = users::ActiveModel {
            id: sea_orm::ActiveValue::Set(user.id),
            email: sea_orm::ActiveValue::Set(user.email),
            display_name: sea_orm::ActiveValue::Set(user.display_name),
            created_at: sea_orm::ActiveValue::Set(created_at),
            updated_at: sea_orm::ActiveValue::Set(now),
        };

        Users::insert(user_model).exec(&self.db).await?;

        let created_user = Users::find_by_id(user.id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created user"))?;

        Ok(Self::model_to_user(created_user))
    }
}

#[async_trait]
impl PlayerDirectory for UserRepository {
    async fn name_of(&self, player_id: Uuid) -> Result<Option<String>, StoreError> {
        let user = Users::find_by_id(player_id)
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(user.map(|model| model.display_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};
    use uuid::Uuid;

    async fn setup_test_db() -> UserRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        UserRepository::new(db)
    }

    fn test_user(email: &str, name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: name.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = setup_test_db().await;
        let user = test_user("test@example.com", "Test User");
        let user_id = user.id;

        let created_user = repo.create_user(user.clone()).await.unwrap();
        assert_eq!(created_user.email, user.email);
        assert_eq!(created_user.display_name, user.display_name);

        let found_user = repo.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(found_user.email, user.email);

        let found_by_email = repo.find_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(found_by_email.id, user_id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = setup_test_db().await;
        repo.create_user(test_user("same@example.com", "One"))
            .await
            .unwrap();
        assert!(
            repo.create_user(test_user("same@example.com", "Two"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_name_of() {
        let repo = setup_test_db().await;
        let user = repo
            .create_user(test_user("ada@example.com", "Ada"))
            .await
            .unwrap();

        assert_eq!(repo.name_of(user.id).await.unwrap(), Some("Ada".to_string()));
        assert_eq!(repo.name_of(Uuid::new_v4()).await.unwrap(), None);
    }
}
