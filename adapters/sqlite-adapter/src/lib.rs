//! sqlite-adapter — SQLite implementation of the `CatalogStore` port.
//!
//! Purpose
//! - Provide a lightweight, file-based store so the catalog survives restarts
//!   without an external database server.
//! - Implements the `CatalogStore` trait from the `domain` crate.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Prices are stored as TEXT so decimal amounts round-trip exactly.
//! - `items.seq` defines list order (insertion order); updates keep it.
//! - Child rows are removed explicitly inside the same transaction as their
//!   owner; there is no reliance on `ON DELETE CASCADE`.

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use domain::{
    CatalogError, CatalogStore, Customization, CustomizationOption, Item, ItemId, ItemType,
    NewItem, SizeOption,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use rust_decimal::Decimal;

/// SQLite-backed catalog store.
pub struct SqliteCatalogStore {
    conn: Mutex<Connection>,
}

impl SqliteCatalogStore {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database. Handy for tests and demos.
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory().map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Construct from env var `DB_PATH` (defaults to `./data/catalog.db`).
    pub fn from_env() -> Result<Self, CatalogError> {
        let path = std::env::var("DB_PATH").unwrap_or_else(|_| "./data/catalog.db".to_string());
        Self::open_creating_dir(path)
    }

    /// Open at `path`, creating its parent directory first.
    pub fn open_creating_dir<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        if let Some(dir) = path.as_ref().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    CatalogError::StorageUnavailable(format!(
                        "cannot create {}: {e}",
                        dir.display()
                    ))
                })?;
            }
        }
        Self::new(path)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::StorageUnavailable("mutex poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), CatalogError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            base_price TEXT NOT NULL,
            item_type TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS item_sizes (
            item_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            price_modifier TEXT NOT NULL,
            PRIMARY KEY (item_id, position)
        );
        CREATE TABLE IF NOT EXISTS customizations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_customizations_item ON customizations(item_id);
        CREATE TABLE IF NOT EXISTS customization_options (
            customization_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            price TEXT NOT NULL,
            PRIMARY KEY (customization_id, position)
        );
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CatalogError {
    CatalogError::StorageUnavailable(format!("sqlite error: {e}"))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, CatalogError> {
    Decimal::from_str(raw)
        .map_err(|e| CatalogError::StorageUnavailable(format!("bad {field} in db '{raw}': {e}")))
}

struct ItemRow {
    id: String,
    code: String,
    name: String,
    category: String,
    base_price: String,
    item_type: String,
}

const ITEM_SELECT_SQL: &str =
    "SELECT id, code, name, category, base_price, item_type FROM items";

fn row_to_item_row(row: &rusqlite::Row) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        base_price: row.get(4)?,
        item_type: row.get(5)?,
    })
}

fn load_sizes(conn: &Connection, item_id: &str) -> Result<Vec<SizeOption>, CatalogError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT name, price_modifier FROM item_sizes WHERE item_id = ?1 ORDER BY position",
        )
        .map_err(map_sqerr)?;
    let rows = stmt
        .query_map(params![item_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(map_sqerr)?;
    let mut out = Vec::new();
    for row in rows {
        let (name, modifier) = row.map_err(map_sqerr)?;
        out.push(SizeOption {
            name,
            price_modifier: parse_decimal("price_modifier", &modifier)?,
        });
    }
    Ok(out)
}

fn load_options(
    conn: &Connection,
    customization_id: i64,
) -> Result<Vec<CustomizationOption>, CatalogError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT name, price FROM customization_options WHERE customization_id = ?1 ORDER BY position",
        )
        .map_err(map_sqerr)?;
    let rows = stmt
        .query_map(params![customization_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(map_sqerr)?;
    let mut out = Vec::new();
    for row in rows {
        let (name, price) = row.map_err(map_sqerr)?;
        out.push(CustomizationOption {
            name,
            price: parse_decimal("price", &price)?,
        });
    }
    Ok(out)
}

fn load_customizations(
    conn: &Connection,
    item_id: &str,
) -> Result<Vec<Customization>, CatalogError> {
    let heads: Vec<(i64, String)> = {
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, name FROM customizations WHERE item_id = ?1 ORDER BY position",
            )
            .map_err(map_sqerr)?;
        let rows = stmt
            .query_map(params![item_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(map_sqerr)?;
        rows.collect::<rusqlite::Result<_>>().map_err(map_sqerr)?
    };
    let mut out = Vec::with_capacity(heads.len());
    for (id, name) in heads {
        out.push(Customization {
            id: id as u64,
            name,
            options: load_options(conn, id)?,
        });
    }
    Ok(out)
}

fn hydrate(conn: &Connection, row: ItemRow) -> Result<Item, CatalogError> {
    let id = ItemId::new(row.id.clone())
        .map_err(|e| CatalogError::StorageUnavailable(format!("bad item id in db: {e}")))?;
    let item_type = ItemType::parse(&row.item_type).ok_or_else(|| {
        CatalogError::StorageUnavailable(format!("bad item_type in db: {}", row.item_type))
    })?;
    Ok(Item {
        sizes: load_sizes(conn, &row.id)?,
        customizations: load_customizations(conn, &row.id)?,
        id,
        code: row.code,
        name: row.name,
        category: row.category,
        base_price: parse_decimal("base_price", &row.base_price)?,
        item_type,
    })
}

/// Insert sizes and customizations for `item`, returning the stored item
/// with the ids SQLite assigned.
fn insert_children(tx: &Transaction, item: NewItem) -> Result<Item, CatalogError> {
    let item_id = item.id.as_str().to_string();
    for (pos, size) in item.sizes.iter().enumerate() {
        tx.execute(
            "INSERT INTO item_sizes(item_id, position, name, price_modifier) VALUES (?1, ?2, ?3, ?4)",
            params![item_id, pos as i64, size.name, size.price_modifier.to_string()],
        )
        .map_err(map_sqerr)?;
    }

    let mut ids = Vec::with_capacity(item.customizations.len());
    for (pos, customization) in item.customizations.iter().enumerate() {
        tx.execute(
            "INSERT INTO customizations(item_id, position, name) VALUES (?1, ?2, ?3)",
            params![item_id, pos as i64, customization.name],
        )
        .map_err(map_sqerr)?;
        let customization_id = tx.last_insert_rowid();
        for (opt_pos, option) in customization.options.iter().enumerate() {
            tx.execute(
                "INSERT INTO customization_options(customization_id, position, name, price) VALUES (?1, ?2, ?3, ?4)",
                params![customization_id, opt_pos as i64, option.name, option.price.to_string()],
            )
            .map_err(map_sqerr)?;
        }
        ids.push(customization_id as u64);
    }

    let mut ids = ids.into_iter();
    Ok(item.into_item(|| ids.next().unwrap_or_default()))
}

/// Remove every child row owned by `item_id`.
fn delete_children(tx: &Transaction, item_id: &str) -> Result<(), CatalogError> {
    tx.execute(
        "DELETE FROM customization_options WHERE customization_id IN (SELECT id FROM customizations WHERE item_id = ?1)",
        params![item_id],
    )
    .map_err(map_sqerr)?;
    tx.execute(
        "DELETE FROM customizations WHERE item_id = ?1",
        params![item_id],
    )
    .map_err(map_sqerr)?;
    tx.execute("DELETE FROM item_sizes WHERE item_id = ?1", params![item_id])
        .map_err(map_sqerr)?;
    Ok(())
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation)
}

impl CatalogStore for SqliteCatalogStore {
    fn list(&self) -> Result<Vec<Item>, CatalogError> {
        let conn = self.lock()?;
        let rows: Vec<ItemRow> = {
            let mut stmt = conn
                .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY seq"))
                .map_err(map_sqerr)?;
            let rows = stmt.query_map([], row_to_item_row).map_err(map_sqerr)?;
            rows.collect::<rusqlite::Result<_>>().map_err(map_sqerr)?
        };
        rows.into_iter().map(|row| hydrate(&conn, row)).collect()
    }

    fn get(&self, id: &ItemId) -> Result<Option<Item>, CatalogError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("{ITEM_SELECT_SQL} WHERE id = ?1"),
                params![id.as_str()],
                row_to_item_row,
            )
            .optional()
            .map_err(map_sqerr)?;
        row.map(|row| hydrate(&conn, row)).transpose()
    }

    fn create(&self, item: NewItem) -> Result<Item, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(map_sqerr)?;
        let res = tx.execute(
            "INSERT INTO items(id, code, name, category, base_price, item_type) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                item.id.as_str(),
                item.code,
                item.name,
                item.category,
                item.base_price.to_string(),
                item.item_type.as_str(),
            ],
        );
        if let Err(e) = res {
            if is_constraint_violation(&e) {
                return Err(CatalogError::AlreadyExists);
            }
            return Err(map_sqerr(e));
        }
        let stored = insert_children(&tx, item)?;
        tx.commit().map_err(map_sqerr)?;
        Ok(stored)
    }

    fn update(&self, item: NewItem) -> Result<Item, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(map_sqerr)?;
        let changed = tx
            .execute(
                "UPDATE items SET code = ?1, name = ?2, category = ?3, base_price = ?4, item_type = ?5 WHERE id = ?6",
                params![
                    item.code,
                    item.name,
                    item.category,
                    item.base_price.to_string(),
                    item.item_type.as_str(),
                    item.id.as_str(),
                ],
            )
            .map_err(map_sqerr)?;
        if changed == 0 {
            return Err(CatalogError::NotFound);
        }
        delete_children(&tx, item.id.as_str())?;
        let stored = insert_children(&tx, item)?;
        tx.commit().map_err(map_sqerr)?;
        Ok(stored)
    }

    fn delete(&self, id: &ItemId) -> Result<(), CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(map_sqerr)?;
        delete_children(&tx, id.as_str())?;
        let changed = tx
            .execute("DELETE FROM items WHERE id = ?1", params![id.as_str()])
            .map_err(map_sqerr)?;
        if changed == 0 {
            // Dropping the transaction rolls back.
            return Err(CatalogError::NotFound);
        }
        tx.commit().map_err(map_sqerr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::NewCustomization;

    fn tmp_db() -> (SqliteCatalogStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let store = SqliteCatalogStore::new(path).unwrap();
        (store, dir)
    }

    fn espresso(id: &str) -> NewItem {
        NewItem {
            id: ItemId::new(id).unwrap(),
            code: "ESP".into(),
            name: "Espresso".into(),
            category: "Coffee".into(),
            base_price: Decimal::new(250, 2),
            item_type: ItemType::Drink,
            sizes: vec![
                SizeOption {
                    name: "Small".into(),
                    price_modifier: Decimal::new(0, 1),
                },
                SizeOption {
                    name: "Large".into(),
                    price_modifier: Decimal::new(75, 2),
                },
            ],
            customizations: vec![NewCustomization {
                name: "Milk".into(),
                options: vec![
                    CustomizationOption {
                        name: "Oat".into(),
                        price: Decimal::new(50, 2),
                    },
                    CustomizationOption {
                        name: "Soy".into(),
                        price: Decimal::new(45, 2),
                    },
                ],
            }],
        }
    }

    fn count(store: &SqliteCatalogStore, table: &str) -> i64 {
        let conn = store.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn create_list_roundtrip_is_lossless() {
        let (store, _dir) = tmp_db();
        let created = store.create(espresso("i1")).unwrap();
        assert!(created.customizations[0].id > 0);

        let items = store.list().unwrap();
        assert_eq!(items, vec![created]);
        let item = &items[0];
        assert_eq!(item.base_price.to_string(), "2.50");
        assert_eq!(item.sizes[0].price_modifier.to_string(), "0.0");
        assert_eq!(item.sizes[1].name, "Large");
        let opts: Vec<_> = item.customizations[0]
            .options
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(opts, vec!["Oat", "Soy"]);
    }

    #[test]
    fn list_empty_store() {
        let (store, _dir) = tmp_db();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn decimals_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.db");
        {
            let store = SqliteCatalogStore::open_creating_dir(&path).unwrap();
            let mut item = espresso("precise");
            item.base_price = Decimal::from_str("1234567.891011").unwrap();
            store.create(item).unwrap();
        }
        let store = SqliteCatalogStore::new(&path).unwrap();
        let got = store
            .get(&ItemId::new("precise").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(got.base_price, Decimal::from_str("1234567.891011").unwrap());
    }

    #[test]
    fn create_duplicate_conflict_leaves_no_children() {
        let (store, _dir) = tmp_db();
        store.create(espresso("dup")).unwrap();
        let err = store.create(espresso("dup")).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists));
        assert_eq!(count(&store, "customizations"), 1);
        assert_eq!(count(&store, "item_sizes"), 2);
    }

    #[test]
    fn list_follows_insertion_order() {
        let (store, _dir) = tmp_db();
        for id in ["b", "c", "a"] {
            store.create(espresso(id)).unwrap();
        }
        let ids: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|i| i.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn get_missing_is_none() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        assert_eq!(store.get(&ItemId::new("nope").unwrap()).unwrap(), None);
    }

    #[test]
    fn delete_cascades_to_customizations_and_options() {
        let (store, _dir) = tmp_db();
        store.create(espresso("keep")).unwrap();
        store.create(espresso("gone")).unwrap();
        assert_eq!(count(&store, "customization_options"), 4);

        store.delete(&ItemId::new("gone").unwrap()).unwrap();

        assert_eq!(count(&store, "items"), 1);
        assert_eq!(count(&store, "item_sizes"), 2);
        assert_eq!(count(&store, "customizations"), 1);
        assert_eq!(count(&store, "customization_options"), 2);
        let remaining = store.list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id.as_str(), "keep");
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (store, _dir) = tmp_db();
        let err = store.delete(&ItemId::new("ghost").unwrap()).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound));
    }

    #[test]
    fn update_replaces_children_and_keeps_order() {
        let (store, _dir) = tmp_db();
        let first = store.create(espresso("first")).unwrap();
        store.create(espresso("second")).unwrap();

        let mut replacement = espresso("first");
        replacement.item_type = ItemType::Merchandise;
        replacement.sizes.clear();
        replacement.customizations[0].options.truncate(1);
        let updated = store.update(replacement).unwrap();

        assert_ne!(updated.customizations[0].id, first.customizations[0].id);
        assert_eq!(count(&store, "customization_options"), 3);

        let items = store.list().unwrap();
        assert_eq!(items[0].id.as_str(), "first");
        assert_eq!(items[0].item_type, ItemType::Merchandise);
        assert!(items[0].sizes.is_empty());
        assert_eq!(items[0], updated);
    }

    #[test]
    fn update_missing_is_not_found() {
        let (store, _dir) = tmp_db();
        let err = store.update(espresso("ghost")).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound));
        assert_eq!(count(&store, "customizations"), 0);
    }

    #[test]
    fn unknown_item_type_in_db_is_storage_error() {
        let (store, _dir) = tmp_db();
        store.create(espresso("i1")).unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute("UPDATE items SET item_type = 'SERVICE'", [])
                .unwrap();
        }
        let err = store.list().unwrap_err();
        assert!(matches!(err, CatalogError::StorageUnavailable(_)));
    }

    #[test]
    fn concurrent_lists_share_one_connection() {
        let (store, _dir) = tmp_db();
        for i in 0..4 {
            store.create(espresso(&format!("i{i}"))).unwrap();
        }
        let store: std::sync::Arc<dyn CatalogStore> = std::sync::Arc::new(store);

        std::thread::scope(|s| {
            for _ in 0..6 {
                let store = &store;
                s.spawn(move || {
                    for _ in 0..10 {
                        let items = store.list().unwrap();
                        let ids: Vec<_> = items.iter().map(|it| it.id.as_str()).collect();
                        assert_eq!(ids, ["i0", "i1", "i2", "i3"]);
                        assert!(items.iter().all(|it| it.customizations.len() == 1));
                    }
                });
            }
        });
    }
}
