//! Encoding and decoding helpers between datom values and the plain-text
//! columns they are stored in.
//!
//! Every value is stored as a `(v_type, v)` pair of strings. Instants are
//! canonical RFC 3339 UTC strings, so equal instants always encode equally;
//! refs are decimal entity ids.

use chrono::{DateTime, SecondsFormat, Utc};
use jotter_core::{
  datom::{AttrId, Datom, EntityId, TxId, Value},
  schema::ValueType,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::AutoSi, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Value ───────────────────────────────────────────────────────────────────

pub fn encode_value_type(t: ValueType) -> &'static str {
  match t {
    ValueType::String => "string",
    ValueType::Instant => "instant",
    ValueType::Ref => "ref",
  }
}

pub fn decode_value_type(s: &str) -> Result<ValueType> {
  match s {
    "string" => Ok(ValueType::String),
    "instant" => Ok(ValueType::Instant),
    "ref" => Ok(ValueType::Ref),
    other => Err(Error::Decode(format!("unknown value type: {other:?}"))),
  }
}

/// Split a value into its `(v_type, v)` columns.
pub fn encode_value(v: &Value) -> (&'static str, String) {
  let text = match v {
    Value::Str(s) => s.clone(),
    Value::Instant(dt) => encode_dt(*dt),
    Value::Ref(id) => id.0.to_string(),
  };
  (encode_value_type(v.value_type()), text)
}

pub fn decode_value(v_type: &str, v: &str) -> Result<Value> {
  Ok(match decode_value_type(v_type)? {
    ValueType::String => Value::Str(v.to_owned()),
    ValueType::Instant => Value::Instant(decode_dt(v)?),
    ValueType::Ref => Value::Ref(EntityId(
      v.parse().map_err(|_| Error::Decode(format!("bad entity ref: {v:?}")))?,
    )),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns read from `current_datoms`.
pub struct RawDatom {
  pub e:      i64,
  pub a:      i64,
  pub v_type: String,
  pub v:      String,
  pub tx:     i64,
}

impl RawDatom {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      e:      row.get(0)?,
      a:      row.get(1)?,
      v_type: row.get(2)?,
      v:      row.get(3)?,
      tx:     row.get(4)?,
    })
  }

  pub fn into_datom(self) -> Result<Datom> {
    Ok(Datom {
      e:     EntityId(self.e),
      a:     AttrId(self.a),
      v:     decode_value(&self.v_type, &self.v)?,
      tx:    TxId(self.tx),
      added: true,
    })
  }
}

/// Raw columns for one attribute of an entity.
pub struct RawAttrValue {
  pub ident:  String,
  pub v_type: String,
  pub v:      String,
}
