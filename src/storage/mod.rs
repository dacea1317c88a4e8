//! Persistence schema.
//!
//! Declares the `commodity_prices` and `weather_metrics` tables that the
//! fetcher records map onto, renders them to SQLite DDL, and can apply
//! them to a pool. Writing rows is left to the caller.
//!
//! Constraint names follow `pk_<table>` and `ix_<table>_<column>`.

use sqlx::SqlitePool;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Date,
    Varchar,
    Float,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Date => "DATE",
            SqlType::Varchar => "VARCHAR",
            SqlType::Float => "FLOAT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub indexed: bool,
    pub primary_key: bool,
}

const fn column(name: &'static str, sql_type: SqlType) -> ColumnDef {
    ColumnDef { name, sql_type, nullable: false, indexed: false, primary_key: false }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

pub const COMMODITY_PRICES: TableDef = TableDef {
    name: "commodity_prices",
    columns: &[
        ColumnDef { indexed: true, primary_key: true, ..column("id", SqlType::Integer) },
        ColumnDef { indexed: true, ..column("date", SqlType::Date) },
        column("symbol", SqlType::Varchar),
        column("close_price", SqlType::Float),
        ColumnDef { nullable: true, ..column("volume", SqlType::Integer) },
    ],
};

pub const WEATHER_METRICS: TableDef = TableDef {
    name: "weather_metrics",
    columns: &[
        ColumnDef { indexed: true, primary_key: true, ..column("id", SqlType::Integer) },
        ColumnDef { indexed: true, ..column("date", SqlType::Date) },
        column("location", SqlType::Varchar),
        column("temp_mean", SqlType::Float),
        column("precip_mm", SqlType::Float),
    ],
};

pub const TABLES: &[TableDef] = &[WEATHER_METRICS, COMMODITY_PRICES];

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns a record supplies (everything except the surrogate key).
    pub fn data_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| !c.primary_key)
            .map(|c| c.name)
            .collect()
    }

    pub fn create_table_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let null = if c.nullable { "" } else { " NOT NULL" };
                format!("{} {}{null}", c.name, c.sql_type.as_sql())
            })
            .collect();

        let pk: Vec<&str> = self.columns.iter().filter(|c| c.primary_key).map(|c| c.name).collect();
        if !pk.is_empty() {
            parts.push(format!("CONSTRAINT pk_{} PRIMARY KEY ({})", self.name, pk.join(", ")));
        }

        format!("CREATE TABLE IF NOT EXISTS {} (\n    {}\n)", self.name, parts.join(",\n    "))
    }

    pub fn create_index_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.indexed)
            .map(|c| {
                format!(
                    "CREATE INDEX IF NOT EXISTS ix_{table}_{col} ON {table} ({col})",
                    table = self.name,
                    col = c.name
                )
            })
            .collect()
    }
}

/// Create both tables and their indexes. Safe to call repeatedly.
pub async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for table in TABLES {
        let ddl = table.create_table_sql();
        debug!(table = table.name, "Creating table");
        sqlx::query(&ddl).execute(pool).await?;
        for ix in table.create_index_sql() {
            sqlx::query(&ix).execute(pool).await?;
        }
    }
    info!(tables = TABLES.len(), "Schema applied");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
