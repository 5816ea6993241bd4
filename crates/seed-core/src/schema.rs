//! Fixed schema of the three seeded entity kinds.
//!
//! The same name is used for a kind's MongoDB collection, its MySQL table
//! and its sequence counter.

use std::fmt;

/// Column type as seen by both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Bool,
    VarChar(u16),
    Timestamp,
}

/// A non-ID column of a seeded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    /// Referenced kind, for foreign-key columns.
    pub references: Option<EntityKind>,
}

impl Column {
    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: false,
            unique: false,
            references: None,
        }
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    const fn references(mut self, kind: EntityKind) -> Self {
        self.references = Some(kind);
        self
    }
}

const USER_PROFILE_COLUMNS: &[Column] = &[
    Column::new("user_name", ColumnType::VarChar(255)).unique(),
    Column::new("password", ColumnType::VarChar(255)),
    Column::new("email", ColumnType::VarChar(255)).unique(),
    Column::new("is_deleted", ColumnType::Bool),
    Column::new("last_modified", ColumnType::Timestamp),
    Column::new("modified_by", ColumnType::BigInt).nullable(),
];

const CHAT_COLUMNS: &[Column] = &[
    Column::new("chat_name", ColumnType::VarChar(255)),
    Column::new("is_group", ColumnType::Bool),
    Column::new("created_by", ColumnType::BigInt).references(EntityKind::UserProfiles),
    Column::new("is_deleted", ColumnType::Bool),
    Column::new("last_modified", ColumnType::Timestamp),
    Column::new("modified_by", ColumnType::BigInt).nullable(),
];

const CHAT_MEMBER_COLUMNS: &[Column] = &[
    Column::new("chat_id", ColumnType::BigInt).references(EntityKind::Chats),
    Column::new("user_id", ColumnType::BigInt).references(EntityKind::UserProfiles),
    Column::new("role", ColumnType::VarChar(50)),
    Column::new("last_modified", ColumnType::Timestamp),
    Column::new("modified_by", ColumnType::BigInt).nullable(),
];

/// The three seeded entity kinds, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    UserProfiles,
    Chats,
    ChatMembers,
}

impl EntityKind {
    /// All kinds in creation (referential) order.
    pub const ALL: [EntityKind; 3] = [
        EntityKind::UserProfiles,
        EntityKind::Chats,
        EntityKind::ChatMembers,
    ];

    /// All kinds in deletion order, reverse of creation.
    pub const DELETION_ORDER: [EntityKind; 3] = [
        EntityKind::ChatMembers,
        EntityKind::Chats,
        EntityKind::UserProfiles,
    ];

    /// Collection, table and counter name.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::UserProfiles => "user_profiles",
            EntityKind::Chats => "chats",
            EntityKind::ChatMembers => "chat_members",
        }
    }

    /// Name of the surrogate key column in the relational store.
    pub fn id_column(&self) -> &'static str {
        match self {
            EntityKind::UserProfiles => "user_id",
            EntityKind::Chats => "chat_id",
            EntityKind::ChatMembers => "chat_member_id",
        }
    }

    /// Non-ID columns in table order.
    pub fn columns(&self) -> &'static [Column] {
        match self {
            EntityKind::UserProfiles => USER_PROFILE_COLUMNS,
            EntityKind::Chats => CHAT_COLUMNS,
            EntityKind::ChatMembers => CHAT_MEMBER_COLUMNS,
        }
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
