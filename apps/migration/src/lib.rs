//! Schema migrations for the Folio database.

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_groups_table;
mod m20250101_000003_create_posts_table;
mod m20250101_000004_create_comments_table;
mod m20250101_000005_create_follows_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_groups_table::Migration),
            Box::new(m20250101_000003_create_posts_table::Migration),
            Box::new(m20250101_000004_create_comments_table::Migration),
            Box::new(m20250101_000005_create_follows_table::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 5);
    }
}
