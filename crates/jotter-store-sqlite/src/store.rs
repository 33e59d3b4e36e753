//! [`SqliteStore`] — the SQLite implementation of [`FactStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use jotter_core::{
  batch::{Batch, EntityRef, TxDatum, TxValue},
  datom::{AttrId, Datom, EntityId, Keyword, TxId, Value},
  entity::Entity,
  query::ScanPlan,
  schema::{CORE_SCHEMA, Cardinality, ValueType},
  store::{FactStore, TxReport},
  tempid::TempId,
};
use rusqlite::{OpenFlags, OptionalExtension as _};
use tracing::{debug, info};

use crate::{
  Error, Result,
  encode::{
    RawAttrValue, RawDatom, decode_value, decode_value_type, encode_dt, encode_value,
    encode_value_type,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Jotter fact store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Create the database at `path` if needed and install the core schema.
  /// Returns `true` when the schema was installed by this call.
  pub async fn create_database(path: impl AsRef<Path>) -> Result<bool> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_tables().await?;
    store.install_schema().await
  }

  /// Connect to an existing database. Fails if `path` does not exist; a
  /// database that was never bootstrapped opens fine but every query on it
  /// reports the missing schema.
  pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
      | OpenFlags::SQLITE_OPEN_URI
      | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = tokio_rusqlite::Connection::open_with_flags(path, flags).await?;
    let store = Self { conn };
    store.init_tables().await?;
    Ok(store)
  }

  /// An empty in-memory database without the core schema.
  pub async fn connect_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_tables().await?;
    Ok(store)
  }

  /// Open an in-memory store with the core schema — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let store = Self::connect_in_memory().await?;
    store.install_schema().await?;
    Ok(store)
  }

  async fn init_tables(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Install any missing core attributes. Returns `true` if any were added.
  pub async fn install_schema(&self) -> Result<bool> {
    let rows: Vec<_> = CORE_SCHEMA
      .iter()
      .map(|def| {
        (
          def.ident.as_str().to_owned(),
          encode_value_type(def.value_type),
          match def.cardinality {
            Cardinality::One => "one",
            Cardinality::Many => "many",
          },
          def.unique,
        )
      })
      .collect();

    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut added = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO attributes (ident, value_type, cardinality, is_unique)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (ident, value_type, cardinality, unique) in &rows {
            added += stmt.execute(rusqlite::params![ident, value_type, cardinality, unique])?;
          }
        }
        tx.commit()?;
        Ok(added)
      })
      .await?;

    if added > 0 {
      info!(attributes = added, "installed core schema");
    }
    Ok(added > 0)
  }

  async fn attribute_id(&self, attr: &Keyword) -> Result<Option<AttrId>> {
    let ident = attr.as_str().to_owned();
    let id = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT attr_id FROM attributes WHERE ident = ?1",
              rusqlite::params![ident],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(id.map(AttrId))
  }
}

// ─── Transactions ────────────────────────────────────────────────────────────

/// An installed attribute, as the write path needs it.
struct AttrRow {
  id:          i64,
  value_type:  ValueType,
  cardinality: Cardinality,
  unique:      bool,
}

fn load_attributes(conn: &rusqlite::Connection) -> Result<HashMap<String, AttrRow>> {
  let mut stmt =
    conn.prepare("SELECT attr_id, ident, value_type, cardinality, is_unique FROM attributes")?;
  let raws = stmt
    .query_map([], |row| {
      Ok((
        row.get::<_, i64>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, bool>(4)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|(id, ident, value_type, cardinality, unique)| {
      let cardinality = match cardinality.as_str() {
        "one" => Cardinality::One,
        "many" => Cardinality::Many,
        other => return Err(Error::Decode(format!("unknown cardinality: {other:?}"))),
      };
      let row = AttrRow { id, value_type: decode_value_type(&value_type)?, cardinality, unique };
      Ok((ident, row))
    })
    .collect()
}

/// Applies one batch inside an open SQLite transaction.
struct Writer<'c> {
  conn:    &'c rusqlite::Connection,
  tx:      i64,
  attrs:   HashMap<String, AttrRow>,
  tempids: HashMap<TempId, EntityId>,
  written: usize,
}

impl Writer<'_> {
  fn entity(&mut self, r: EntityRef) -> Result<EntityId> {
    match r {
      EntityRef::Temp(temp) => {
        if let Some(&id) = self.tempids.get(&temp) {
          return Ok(id);
        }
        self
          .conn
          .execute("INSERT INTO entities (tx_id) VALUES (?1)", rusqlite::params![self.tx])?;
        let id = EntityId(self.conn.last_insert_rowid());
        self.tempids.insert(temp, id);
        Ok(id)
      }
      EntityRef::Id(id) => {
        let exists = self
          .conn
          .query_row(
            "SELECT 1 FROM entities WHERE entity_id = ?1",
            rusqlite::params![id.0],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if exists { Ok(id) } else { Err(Error::EntityNotFound(id)) }
      }
    }
  }

  fn current_values(&self, e: EntityId, a: i64) -> Result<Vec<(String, String)>> {
    let mut stmt =
      self.conn.prepare("SELECT v_type, v FROM current_datoms WHERE e = ?1 AND a = ?2")?;
    let rows = stmt
      .query_map(rusqlite::params![e.0, a], |row| Ok((row.get(0)?, row.get(1)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }

  fn insert(&mut self, e: EntityId, a: i64, v_type: &str, v: &str, added: bool) -> Result<()> {
    self.conn.execute(
      "INSERT INTO datoms (e, a, v_type, v, tx, added) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rusqlite::params![e.0, a, v_type, v, self.tx, added],
    )?;
    self.written += 1;
    Ok(())
  }

  fn apply(&mut self, datom: TxDatum) -> Result<()> {
    let TxDatum { e, a: ident, v } = datom;
    let (attr_id, value_type, cardinality, unique) = match self.attrs.get(ident.as_str()) {
      Some(row) => (row.id, row.value_type, row.cardinality, row.unique),
      None => return Err(jotter_core::Error::UnknownAttribute(ident).into()),
    };

    let e = self.entity(e)?;
    let value = match v {
      TxValue::Str(s) => Value::Str(s),
      TxValue::Instant(dt) => Value::Instant(dt),
      TxValue::Ref(r) => Value::Ref(self.entity(r)?),
    };
    if value.value_type() != value_type {
      return Err(
        jotter_core::Error::UnexpectedValue {
          entity: e,
          attr: ident,
          expected: value_type,
          found: value.value_type(),
        }
        .into(),
      );
    }
    let (v_type, v) = encode_value(&value);

    if unique {
      let holder: Option<i64> = self
        .conn
        .query_row(
          "SELECT e FROM current_datoms WHERE a = ?1 AND v_type = ?2 AND v = ?3 AND e != ?4
           LIMIT 1",
          rusqlite::params![attr_id, v_type, v, e.0],
          |row| row.get(0),
        )
        .optional()?;
      if let Some(holder) = holder {
        return Err(Error::UniqueConflict { attr: ident, value: v, holder: EntityId(holder) });
      }
    }

    let current = self.current_values(e, attr_id)?;
    if current.iter().any(|(t, cv)| t == v_type && *cv == v) {
      return Ok(());
    }
    if cardinality == Cardinality::One {
      for (old_type, old) in &current {
        self.insert(e, attr_id, old_type, old, false)?;
      }
    }
    self.insert(e, attr_id, v_type, &v, true)
  }
}

fn transact_blocking(conn: &mut rusqlite::Connection, batch: Batch) -> Result<TxReport> {
  let sql_tx = conn.transaction()?;
  sql_tx.execute(
    "INSERT INTO transactions (recorded_at) VALUES (?1)",
    rusqlite::params![encode_dt(Utc::now())],
  )?;
  let tx = sql_tx.last_insert_rowid();

  let mut writer = Writer {
    conn: &sql_tx,
    tx,
    attrs: load_attributes(&sql_tx)?,
    tempids: HashMap::new(),
    written: 0,
  };
  for datom in batch {
    writer.apply(datom)?;
  }
  let report = TxReport { tx: TxId(tx), fact_count: writer.written, tempids: writer.tempids };

  sql_tx.commit()?;
  Ok(report)
}

// ─── FactStore impl ──────────────────────────────────────────────────────────

impl FactStore for SqliteStore {
  type Error = Error;

  async fn resolve_attribute(&self, ident: &Keyword) -> Result<Option<AttrId>> {
    self.attribute_id(ident).await
  }

  async fn resolve_lookup_ref(&self, attr: &Keyword, value: Value) -> Result<Option<EntityId>> {
    let Some(a) = self.attribute_id(attr).await? else {
      return Ok(None);
    };
    let (v_type, v) = encode_value(&value);

    let e: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT e FROM current_datoms WHERE a = ?1 AND v_type = ?2 AND v = ?3
               ORDER BY e LIMIT 1",
              rusqlite::params![a.0, v_type, v],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(e.map(EntityId))
  }

  async fn scan(&self, plan: &ScanPlan) -> Result<Vec<Datom>> {
    let attr = plan.pinned_attribute().map(|a| a.0);
    let (v_type, v) = match plan.pinned_value().map(encode_value) {
      Some((t, v)) => (Some(t), Some(v)),
      None => (None, None),
    };

    let raws: Vec<RawDatom> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT e, a, v_type, v, tx FROM current_datoms
           WHERE (?1 IS NULL OR a = ?1)
             AND (?2 IS NULL OR (v_type = ?2 AND v = ?3))",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![attr, v_type, v], RawDatom::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut datoms = Vec::with_capacity(raws.len());
    for raw in raws {
      let datom = raw.into_datom()?;
      if plan.contains(&datom) {
        datoms.push(datom);
      }
    }
    plan.sort(&mut datoms);
    debug!(index = %plan.index, hits = datoms.len(), "scan complete");
    Ok(datoms)
  }

  async fn entity(&self, id: EntityId) -> Result<Option<Entity>> {
    let raws: Vec<RawAttrValue> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT attr.ident, d.v_type, d.v
           FROM current_datoms d
           JOIN attributes attr ON attr.attr_id = d.a
           WHERE d.e = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id.0], |row| {
            Ok(RawAttrValue { ident: row.get(0)?, v_type: row.get(1)?, v: row.get(2)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    if raws.is_empty() {
      return Ok(None);
    }
    let mut entity = Entity::new(id);
    for raw in raws {
      entity.insert(Keyword::parse(&raw.ident)?, decode_value(&raw.v_type, &raw.v)?);
    }
    Ok(Some(entity))
  }

  async fn transact(&self, batch: Batch) -> Result<TxReport> {
    // Domain failures come back as the closure's value; the SQL transaction
    // has already rolled back by then.
    self.conn.call(move |conn| Ok(transact_blocking(conn, batch))).await?
  }
}
