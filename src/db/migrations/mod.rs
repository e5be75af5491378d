pub mod m000001_create_history_tables;
pub mod m000002_create_jails;
pub mod m000003_create_tickets;
pub mod m000004_create_incidents;
pub mod m000005_create_role_mappings;
pub mod m000006_create_staff_whitelist;

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m000001_create_history_tables::Migration),
            Box::new(m000002_create_jails::Migration),
            Box::new(m000003_create_tickets::Migration),
            Box::new(m000004_create_incidents::Migration),
            Box::new(m000005_create_role_mappings::Migration),
            Box::new(m000006_create_staff_whitelist::Migration),
        ]
    }
}
