// (C) Coralbits SL 2025
// This file is part of Pgcache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use uuid::Uuid;

/// The five statements a cache engine executes, built once per instance with
/// the configured table name interpolated. The table name is trusted
/// configuration; key and value always travel as bind parameters.
///
/// sqlx prepares each statement server-side on first execution and reuses it
/// through its per-connection statement cache, so preparation happens once
/// per engine. `id` is a random per-instance identifier carried along for
/// log correlation when several engines share a process.
#[derive(Debug)]
pub(crate) struct StatementSet {
    pub id: String,
    pub read: String,
    pub write: String,
    pub exists: String,
    pub delete: String,
    pub clear: String,
}

impl StatementSet {
    pub fn new(table_name: &str) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            read: format!(
                "SELECT {t}.value FROM {t} WHERE {t}.key = $1::text",
                t = table_name
            ),
            write: format!(
                "INSERT INTO {t} (key, value) VALUES ($1::text, $2::bytea) \
                 ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
                t = table_name
            ),
            exists: format!("SELECT 1 FROM {t} WHERE {t}.key = $1::text", t = table_name),
            delete: format!("DELETE FROM {t} WHERE {t}.key = $1::text", t = table_name),
            clear: format!("TRUNCATE TABLE {t}", t = table_name),
        }
    }
}
