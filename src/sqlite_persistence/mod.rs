mod versioned_schema;

pub use versioned_schema::{
    migrate_if_needed, Column, OnConflict, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
};
