use sea_orm_migration::prelude::*;

mod m20260701_000001_create_users;
mod m20260701_000002_create_auth_methods;
mod m20260701_000003_create_sessions;
mod m20260701_000004_create_verification_codes;
mod m20260701_000005_create_siwe_challenges;
mod m20260701_000006_create_personal_access_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260701_000001_create_users::Migration),
            Box::new(m20260701_000002_create_auth_methods::Migration),
            Box::new(m20260701_000003_create_sessions::Migration),
            Box::new(m20260701_000004_create_verification_codes::Migration),
            Box::new(m20260701_000005_create_siwe_challenges::Migration),
            Box::new(m20260701_000006_create_personal_access_tokens::Migration),
        ]
    }
}
