//! Typed bind values for PostgreSQL write statements.

use crate::entity::FieldValue;
use chrono::NaiveDate;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value bound to a `$n` placeholder.
#[derive(Clone, Debug)]
pub enum PgParam {
    Null,
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

impl From<FieldValue> for PgParam {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => PgParam::Null,
            FieldValue::Text(s) => PgParam::Text(s),
            FieldValue::Date(d) => PgParam::Date(d),
        }
    }
}

impl From<i64> for PgParam {
    fn from(value: i64) -> Self {
        PgParam::Int(value)
    }
}

impl<'q> Encode<'q, Postgres> for PgParam {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgParam::Null => <Option<&str> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgParam::Int(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgParam::Text(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgParam::Date(d) => <NaiveDate as Encode<Postgres>>::encode_by_ref(d, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgParam::Null | PgParam::Text(_) => PgTypeInfo::with_name("TEXT"),
            PgParam::Int(_) => PgTypeInfo::with_name("INT8"),
            PgParam::Date(_) => PgTypeInfo::with_name("DATE"),
        })
    }
}

impl sqlx::Type<Postgres> for PgParam {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}
