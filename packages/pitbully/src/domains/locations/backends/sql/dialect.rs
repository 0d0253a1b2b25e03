use crate::config::DatabaseKind;

pub const PLAYER_LOCATIONS: &str = "player_locations";
pub const PLAYER_SETTINGS: &str = "player_settings";
pub const WARP_LOCATIONS: &str = "warp_locations";
pub const WORLD_SPAWN: &str = "world_spawn";

/// How an engine writes "insert, or update the row with this key".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStyle {
    /// `INSERT .. ON DUPLICATE KEY UPDATE col = VALUES(col)`
    OnDuplicateKey,
    /// `INSERT .. ON CONFLICT (keys) DO UPDATE SET col = EXCLUDED.col`
    OnConflict,
    /// `DELETE` by key, then `INSERT`, inside the caller's transaction
    DeleteThenInsert,
}

/// Statements for one upsert.
///
/// `DeleteThenInsert` binds the key columns to `delete` and the key columns
/// followed by the value columns to `insert`. `Single` binds keys then values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    Single(String),
    DeleteThenInsert { delete: String, insert: String },
}

/// SQL text generation for one database family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    kind: DatabaseKind,
}

impl Dialect {
    pub fn new(kind: DatabaseKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    pub fn upsert_style(&self) -> UpsertStyle {
        match self.kind {
            DatabaseKind::MySql | DatabaseKind::MariaDb => UpsertStyle::OnDuplicateKey,
            DatabaseKind::Postgres => UpsertStyle::OnConflict,
            DatabaseKind::Sqlite => UpsertStyle::DeleteThenInsert,
        }
    }

    /// Rewrite `?` placeholders into the engine's style.
    ///
    /// Statement templates never contain a literal `?`.
    pub fn sql(&self, template: &str) -> String {
        if self.kind != DatabaseKind::Postgres {
            return template.to_string();
        }
        let mut out = String::with_capacity(template.len() + 8);
        let mut n = 0;
        for c in template.chars() {
            if c == '?' {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            } else {
                out.push(c);
            }
        }
        out
    }

    pub fn upsert(&self, table: &str, keys: &[&str], values: &[&str]) -> Upsert {
        let columns: Vec<&str> = keys.iter().chain(values).copied().collect();
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        match self.upsert_style() {
            UpsertStyle::OnDuplicateKey => {
                let updates: Vec<String> = values
                    .iter()
                    .map(|c| format!("{c} = VALUES({c})"))
                    .chain(std::iter::once("updated_at = CURRENT_TIMESTAMP".to_string()))
                    .collect();
                Upsert::Single(format!(
                    "{} ON DUPLICATE KEY UPDATE {}",
                    insert,
                    updates.join(", ")
                ))
            }
            UpsertStyle::OnConflict => {
                let updates: Vec<String> = values
                    .iter()
                    .map(|c| format!("{c} = EXCLUDED.{c}"))
                    .chain(std::iter::once("updated_at = CURRENT_TIMESTAMP".to_string()))
                    .collect();
                Upsert::Single(self.sql(&format!(
                    "{} ON CONFLICT ({}) DO UPDATE SET {}",
                    insert,
                    keys.join(", "),
                    updates.join(", ")
                )))
            }
            UpsertStyle::DeleteThenInsert => {
                let predicate: Vec<String> = keys.iter().map(|c| format!("{c} = ?")).collect();
                Upsert::DeleteThenInsert {
                    delete: self.sql(&format!(
                        "DELETE FROM {} WHERE {}",
                        table,
                        predicate.join(" AND ")
                    )),
                    insert: self.sql(&insert),
                }
            }
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` statements for every table, in order.
    pub fn schema(&self) -> Vec<String> {
        let t = self.types();
        let location_type = match self.kind {
            DatabaseKind::MySql | DatabaseKind::MariaDb => {
                "location_type ENUM('death', 'teleport', 'last', 'home') NOT NULL".to_string()
            }
            _ => format!(
                "location_type {} NOT NULL CHECK (location_type IN ('death', 'teleport', 'last', 'home'))",
                t.short_text
            ),
        };
        let coordinates = |with_world: bool| {
            let world = if with_world {
                format!("    world_name {} NOT NULL,\n", t.text)
            } else {
                String::new()
            };
            format!(
                "{world}    x {d} NOT NULL,\n    y {d} NOT NULL,\n    z {d} NOT NULL,\n    yaw {d} NOT NULL DEFAULT 0,\n    pitch {d} NOT NULL DEFAULT 0,\n",
                d = t.double
            )
        };
        let timestamps = format!(
            "    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP,\n    updated_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP{on_update}",
            ts = t.timestamp,
            on_update = t.on_update
        );

        vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {PLAYER_LOCATIONS} (\n    id {id},\n    player_id {actor} NOT NULL,\n    {location_type},\n{coords}{timestamps},\n    UNIQUE (player_id, location_type)\n)",
                id = t.id,
                actor = t.actor_id,
                coords = coordinates(true),
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {PLAYER_SETTINGS} (\n    id {id},\n    player_id {actor} NOT NULL UNIQUE,\n    keep_xp {int} NOT NULL DEFAULT 1,\n{timestamps}\n)",
                id = t.id,
                actor = t.actor_id,
                int = t.bigint,
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {WARP_LOCATIONS} (\n    id {id},\n    warp_name {name} NOT NULL UNIQUE,\n{coords}{timestamps}\n)",
                id = t.id,
                name = t.case_sensitive_text,
                coords = coordinates(true),
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {WORLD_SPAWN} (\n    id {id},\n    world_name {text} NOT NULL UNIQUE,\n{coords}{timestamps}\n)",
                id = t.id,
                text = t.text,
                coords = coordinates(false),
            ),
        ]
    }

    fn types(&self) -> ColumnTypes {
        match self.kind {
            DatabaseKind::MySql | DatabaseKind::MariaDb => ColumnTypes {
                id: "BIGINT AUTO_INCREMENT PRIMARY KEY",
                actor_id: "VARCHAR(36)",
                text: "VARCHAR(255)",
                case_sensitive_text: "VARCHAR(255) BINARY",
                short_text: "VARCHAR(16)",
                double: "DOUBLE",
                bigint: "BIGINT",
                timestamp: "TIMESTAMP",
                on_update: " ON UPDATE CURRENT_TIMESTAMP",
            },
            DatabaseKind::Postgres => ColumnTypes {
                id: "BIGSERIAL PRIMARY KEY",
                actor_id: "VARCHAR(36)",
                text: "VARCHAR(255)",
                case_sensitive_text: "VARCHAR(255)",
                short_text: "VARCHAR(16)",
                double: "DOUBLE PRECISION",
                bigint: "BIGINT",
                timestamp: "TIMESTAMPTZ",
                on_update: "",
            },
            DatabaseKind::Sqlite => ColumnTypes {
                id: "INTEGER PRIMARY KEY AUTOINCREMENT",
                actor_id: "TEXT",
                text: "TEXT",
                case_sensitive_text: "TEXT",
                short_text: "TEXT",
                double: "REAL",
                bigint: "INTEGER",
                timestamp: "TEXT",
                on_update: "",
            },
        }
    }
}

struct ColumnTypes {
    id: &'static str,
    actor_id: &'static str,
    text: &'static str,
    /// Warp names compare case-sensitively on every engine
    case_sensitive_text: &'static str,
    short_text: &'static str,
    double: &'static str,
    bigint: &'static str,
    timestamp: &'static str,
    on_update: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &["player_id", "location_type"];
    const VALUES: &[&str] = &["world_name", "x"];

    #[test]
    fn mysql_family_uses_on_duplicate_key() {
        for kind in [DatabaseKind::MySql, DatabaseKind::MariaDb] {
            let Upsert::Single(sql) = Dialect::new(kind).upsert(PLAYER_LOCATIONS, KEYS, VALUES) else {
                panic!("expected a single statement");
            };
            assert_eq!(
                sql,
                "INSERT INTO player_locations (player_id, location_type, world_name, x) VALUES (?, ?, ?, ?) \
                 ON DUPLICATE KEY UPDATE world_name = VALUES(world_name), x = VALUES(x), updated_at = CURRENT_TIMESTAMP"
            );
        }
    }

    #[test]
    fn postgres_uses_on_conflict_with_numbered_placeholders() {
        let Upsert::Single(sql) =
            Dialect::new(DatabaseKind::Postgres).upsert(PLAYER_LOCATIONS, KEYS, VALUES)
        else {
            panic!("expected a single statement");
        };
        assert!(sql.contains("VALUES ($1, $2, $3, $4)"));
        assert!(sql.contains("ON CONFLICT (player_id, location_type) DO UPDATE SET"));
        assert!(sql.contains("x = EXCLUDED.x"));
    }

    #[test]
    fn sqlite_deletes_then_inserts() {
        let upsert = Dialect::new(DatabaseKind::Sqlite).upsert(PLAYER_LOCATIONS, KEYS, VALUES);
        assert_eq!(
            upsert,
            Upsert::DeleteThenInsert {
                delete: "DELETE FROM player_locations WHERE player_id = ? AND location_type = ?"
                    .to_string(),
                insert: "INSERT INTO player_locations (player_id, location_type, world_name, x) VALUES (?, ?, ?, ?)"
                    .to_string(),
            }
        );
    }

    #[test]
    fn placeholders_are_numbered_for_postgres_only() {
        let template = "SELECT x FROM warp_locations WHERE warp_name = ? AND world_name = ?";
        assert_eq!(Dialect::new(DatabaseKind::Sqlite).sql(template), template);
        assert!(Dialect::new(DatabaseKind::Postgres)
            .sql(template)
            .ends_with("warp_name = $1 AND world_name = $2"));
    }

    #[test]
    fn schema_is_idempotent_and_unique_keyed() {
        for kind in DatabaseKind::all() {
            let schema = Dialect::new(kind).schema();
            assert_eq!(schema.len(), 4);
            assert!(schema.iter().all(|ddl| ddl.starts_with("CREATE TABLE IF NOT EXISTS")));
            assert!(schema[0].contains("UNIQUE (player_id, location_type)"));
            assert!(schema[2].contains("warp_name"));
        }
        assert!(Dialect::new(DatabaseKind::MySql).schema()[0].contains("ENUM('death'"));
        assert!(Dialect::new(DatabaseKind::Postgres).schema()[0].contains("DOUBLE PRECISION"));
    }
}
