use crate::seed::Seeder;
use crate::seeds::{LECTURER_USERNAME, STUDENT_COUNT, STUDENT_PREFIX};
use db::models::user::Model;
use fake::{
    Fake,
    faker::{internet::en::SafeEmail, name::en::Name},
};
use sea_orm::{DatabaseConnection, DbErr};

pub struct UserSeeder;

#[async_trait::async_trait]
impl Seeder for UserSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        if Model::find_by_username(db, LECTURER_USERNAME).await?.is_none() {
            Model::create(
                db,
                LECTURER_USERNAME,
                "lecturer@example.com",
                Some("Dr. Adaeze Okafor"),
            )
            .await?;
        }

        for i in 1..=STUDENT_COUNT {
            let username = format!("{STUDENT_PREFIX}{i:08}");
            if Model::find_by_username(db, &username).await?.is_some() {
                continue;
            }
            let email: String = SafeEmail().fake();
            let name: String = Name().fake();
            // fake emails can collide; emails are unique
            let email = format!("{i}.{email}");
            Model::create(db, &username, &email, Some(name.as_str())).await?;
        }

        Ok(())
    }
}
