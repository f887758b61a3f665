//! SQLite serialization for record kinds

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::core::records::RecordKind;

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(RecordKind::Count),
            "mean" => Ok(RecordKind::Mean),
            "pass_rate" => Ok(RecordKind::PassRate),
            _ => Err(format!("Unknown record kind: {}", s)),
        }
    }
}

impl ToSql for RecordKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RecordKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse()
            .map_err(|e: String| FromSqlError::Other(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e,
            ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_record_kind_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE test (kind TEXT)", []).unwrap();

        for kind in [RecordKind::Count, RecordKind::Mean, RecordKind::PassRate] {
            conn.execute("DELETE FROM test", []).unwrap();
            conn.execute("INSERT INTO test VALUES (?1)", [&kind])
                .unwrap();

            let retrieved: RecordKind = conn
                .query_row("SELECT kind FROM test", [], |row| row.get(0))
                .unwrap();

            assert_eq!(kind, retrieved);
        }
    }

    #[test]
    fn test_unknown_record_kind_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<RecordKind> =
            conn.query_row("SELECT 'median'", [], |row| row.get(0));
        assert!(result.is_err());
    }
}
