//! DDL for the seeded tables.
//!
//! Columns, unique keys and foreign keys all come from
//! [`seed_core::EntityKind::columns`], so the MySQL schema cannot drift
//! from the canonical records.

use seed_core::{ColumnType, EntityKind};

pub fn column_ddl(column_type: ColumnType) -> String {
    match column_type {
        ColumnType::BigInt => "BIGINT".to_string(),
        // Boolean - MySQL uses TINYINT(1)
        ColumnType::Bool => "TINYINT(1)".to_string(),
        ColumnType::VarChar(length) => format!("VARCHAR({length})"),
        ColumnType::Timestamp => "DATETIME(6)".to_string(),
    }
}

/// `CREATE TABLE IF NOT EXISTS` for one kind.
pub fn create_table(kind: EntityKind) -> String {
    let table = kind.name();
    let mut lines = vec![format!("`{}` BIGINT NOT NULL", kind.id_column())];

    for column in kind.columns() {
        let null = if column.nullable { "NULL" } else { "NOT NULL" };
        lines.push(format!(
            "`{}` {} {}",
            column.name,
            column_ddl(column.column_type),
            null
        ));
    }

    lines.push(format!("PRIMARY KEY (`{}`)", kind.id_column()));

    for column in kind.columns().iter().filter(|c| c.unique) {
        lines.push(format!(
            "UNIQUE KEY `uq_{table}_{name}` (`{name}`)",
            name = column.name
        ));
    }

    for column in kind.columns() {
        if let Some(parent) = column.references {
            lines.push(format!(
                "CONSTRAINT `fk_{table}_{name}` FOREIGN KEY (`{name}`) REFERENCES `{}` (`{}`)",
                parent.name(),
                parent.id_column(),
                name = column.name
            ));
        }
    }

    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (\n  {}\n)",
        lines.join(",\n  ")
    )
}

/// CREATE statements in creation order.
pub fn create_all() -> Vec<String> {
    EntityKind::ALL.into_iter().map(create_table).collect()
}

/// Generate DROP TABLE statement.
pub fn drop_table(kind: EntityKind) -> String {
    format!("DROP TABLE IF EXISTS `{}`", kind.name())
}

/// DROP statements in deletion order.
pub fn drop_all() -> Vec<String> {
    EntityKind::DELETION_ORDER.into_iter().map(drop_table).collect()
}
