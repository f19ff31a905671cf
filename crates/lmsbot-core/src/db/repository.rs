//! Generic insert-once repository shared by every mirrored entity kind

use std::fmt;
use std::marker::PhantomData;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use super::schema::{Entity, SEQUENCE_COLUMN};
use super::Database;
use crate::error::Result;

/// A mirrored row together with its local sequence number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored<E> {
    pub seq: i64,
    pub entity: E,
}

/// Append-only mirror table for one entity kind.
///
/// Rows are inserted once per natural key and never updated. A table that has
/// not been created yet reads as an empty store; any other failure is
/// returned as an error.
pub struct EntityStore<'a, E> {
    db: &'a Database,
    kind: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityStore<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EntityStore<'_, E> {}

impl<E: Entity> fmt::Debug for EntityStore<'_, E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EntityStore")
            .field("table", &E::SCHEMA.table)
            .finish()
    }
}

impl<'a, E: Entity> EntityStore<'a, E> {
    /// Create a store for `E` backed by the given database
    pub const fn new(db: &'a Database) -> Self {
        Self {
            db,
            kind: PhantomData,
        }
    }

    /// Mirror table name
    pub const fn table(&self) -> &'static str {
        E::SCHEMA.table
    }

    fn ensure_table(&self) -> Result<()> {
        self.db
            .connection()
            .execute_batch(&E::SCHEMA.create_table_sql())?;
        Ok(())
    }

    /// Insert every record whose natural key is not mirrored yet.
    ///
    /// Records that already exist (including duplicates earlier in the same
    /// batch) are skipped. Returns the number of rows actually inserted.
    pub fn upsert_many<'r, I>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'r E>,
        E: 'r,
    {
        self.ensure_table()?;

        let tx = self.db.connection().unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&E::SCHEMA.insert_sql())?;
            for record in records {
                inserted += stmt.execute(params_from_iter(record.to_values()))?;
            }
        }
        tx.commit()?;

        if inserted > 0 {
            tracing::debug!(table = self.table(), inserted, "Mirrored new rows");
        }
        Ok(inserted)
    }

    /// All rows ordered by sequence number, ascending
    pub fn all(&self) -> Result<Vec<Stored<E>>> {
        self.since(0)
    }

    /// Rows with a sequence number strictly greater than `cursor`, ascending
    pub fn since(&self, cursor: i64) -> Result<Vec<Stored<E>>> {
        if !self.db.table_exists(self.table())? {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{} WHERE {SEQUENCE_COLUMN} > ?1 ORDER BY {SEQUENCE_COLUMN} ASC",
            E::SCHEMA.select_sql()
        );
        let mut stmt = self.db.connection().prepare(&sql)?;
        let rows = stmt
            .query_map(params![cursor], Self::parse_stored)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Highest sequence number present, `None` for an empty store
    pub fn latest_sequence(&self) -> Result<Option<i64>> {
        if !self.db.table_exists(self.table())? {
            return Ok(None);
        }

        let latest = self.db.connection().query_row(
            &format!("SELECT MAX({SEQUENCE_COLUMN}) FROM {}", self.table()),
            [],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(latest)
    }

    /// Look up a row by its natural key values, in `natural_key` order
    pub fn find_by_key(&self, key: &[Value]) -> Result<Option<Stored<E>>> {
        if !self.db.table_exists(self.table())? {
            return Ok(None);
        }

        let sql = format!(
            "{} WHERE {}",
            E::SCHEMA.select_sql(),
            E::SCHEMA.key_predicate_sql()
        );
        let result = self
            .db
            .connection()
            .query_row(&sql, params_from_iter(key), Self::parse_stored);

        match result {
            Ok(stored) => Ok(Some(stored)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of mirrored rows
    pub fn count(&self) -> Result<usize> {
        if !self.db.table_exists(self.table())? {
            return Ok(0);
        }

        let count: i64 = self.db.connection().query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn parse_stored(row: &rusqlite::Row<'_>) -> rusqlite::Result<Stored<E>> {
        Ok(Stored {
            seq: row.get(0)?,
            entity: E::from_row(row)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, LectureFile};
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn course(id: i64, name: &str) -> Course {
        Course {
            remote_id: id,
            name: name.to_string(),
            code: format!("CS{id}"),
        }
    }

    fn lecture(course_id: i64, file_name: &str, size: i64) -> LectureFile {
        LectureFile {
            course_id,
            course_name: "Operating Systems".to_string(),
            file_name: file_name.to_string(),
            size: Some(size),
        }
    }

    #[test]
    fn test_empty_store_reads_as_empty() {
        let db = setup();
        let store = EntityStore::<Course>::new(&db);

        assert!(store.all().unwrap().is_empty());
        assert_eq!(store.latest_sequence().unwrap(), None);
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.find_by_key(&[Value::Integer(1)]).unwrap(), None);
        assert!(!db.table_exists("course").unwrap());
    }

    #[test]
    fn test_upsert_creates_table_lazily() {
        let db = setup();
        let store = EntityStore::<Course>::new(&db);

        let inserted = store.upsert_many(Vec::<Course>::new().iter()).unwrap();
        assert_eq!(inserted, 0);
        assert!(db.table_exists("course").unwrap());
        assert_eq!(store.latest_sequence().unwrap(), None);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let db = setup();
        let store = EntityStore::<Course>::new(&db);
        let courses = vec![course(10, "Compilers"), course(11, "Databases")];

        assert_eq!(store.upsert_many(&courses).unwrap(), 2);
        let before = store.all().unwrap();

        assert_eq!(store.upsert_many(&courses).unwrap(), 0);
        assert_eq!(store.all().unwrap(), before);
    }

    #[test]
    fn test_upsert_skips_duplicates_within_batch() {
        let db = setup();
        let store = EntityStore::<Course>::new(&db);
        let batch = vec![course(1, "Compilers"), course(1, "Compilers"), course(2, "Networks")];

        assert_eq!(store.upsert_many(&batch).unwrap(), 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_existing_row_is_never_updated() {
        let db = setup();
        let store = EntityStore::<Course>::new(&db);

        store.upsert_many(&[course(1, "Compilers")]).unwrap();
        store.upsert_many(&[course(1, "Renamed Course")]).unwrap();

        let stored = store.find_by_key(&[Value::Integer(1)]).unwrap().unwrap();
        assert_eq!(stored.entity.name, "Compilers");
    }

    #[test]
    fn test_sequence_strictly_increases_in_insert_order() {
        let db = setup();
        let store = EntityStore::<Course>::new(&db);

        store.upsert_many(&[course(30, "C"), course(10, "A")]).unwrap();
        store.upsert_many(&[course(20, "B")]).unwrap();

        let rows = store.all().unwrap();
        let ids = rows.iter().map(|row| row.entity.remote_id).collect::<Vec<_>>();
        assert_eq!(ids, vec![30, 10, 20]);
        assert!(rows.windows(2).all(|pair| pair[0].seq < pair[1].seq));
        assert_eq!(store.latest_sequence().unwrap(), Some(rows[2].seq));
    }

    #[test]
    fn test_since_returns_only_newer_rows() {
        let db = setup();
        let store = EntityStore::<Course>::new(&db);

        store.upsert_many(&[course(1, "A"), course(2, "B")]).unwrap();
        let cursor = store.latest_sequence().unwrap().unwrap();
        store.upsert_many(&[course(3, "C")]).unwrap();

        let newer = store.since(cursor).unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].entity.remote_id, 3);
    }

    #[test]
    fn test_composite_key_ignores_size_change() {
        let db = setup();
        let store = EntityStore::<LectureFile>::new(&db);

        store.upsert_many(&[lecture(7, "week1.pdf", 1000)]).unwrap();
        let inserted = store.upsert_many(&[lecture(7, "week1.pdf", 1200)]).unwrap();
        assert_eq!(inserted, 0);

        let key = lecture(7, "week1.pdf", 0).natural_key();
        let stored = store.find_by_key(&key).unwrap().unwrap();
        assert_eq!(stored.entity.size, Some(1000));
    }

    #[test]
    fn test_composite_key_distinguishes_courses() {
        let db = setup();
        let store = EntityStore::<LectureFile>::new(&db);

        let inserted = store
            .upsert_many(&[lecture(7, "syllabus.pdf", 10), lecture(8, "syllabus.pdf", 10)])
            .unwrap();
        assert_eq!(inserted, 2);
    }

    #[test]
    fn test_storage_fault_is_not_reported_as_empty() {
        let db = setup();
        // A table with the right name but the wrong shape
        db.connection()
            .execute_batch("CREATE TABLE course (unrelated TEXT)")
            .unwrap();
        let store = EntityStore::<Course>::new(&db);

        assert!(store.all().is_err());
        assert!(store.latest_sequence().is_err());
    }
}
