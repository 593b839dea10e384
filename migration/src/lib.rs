pub use sea_orm_migration::prelude::*;

mod m20250508_000001_create_users;
mod m20250508_000002_hr_tables;
mod m20250509_000003_hr_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250508_000001_create_users::Migration),
            Box::new(m20250508_000002_hr_tables::Migration),
            Box::new(m20250509_000003_hr_indexes::Migration),
        ]
    }
}
