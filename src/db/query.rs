//! Generic filtered, sorted and paged queries
//!
//! Every searchable entity publishes a whitelist of API field names mapped to
//! SQL expressions. A `SearchCriteria` is first compiled against that
//! whitelist, which rejects unknown fields, operators that do not apply to a
//! field and values of the wrong type. The compiled query is then run as a
//! `COUNT(*)` plus a `LIMIT/OFFSET` select with every value bound.
//!
//! Ordering always ends with `id ASC`, so pages never overlap or skip rows
//! when the requested sort keys tie.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::search::{
    page_count, Page, Pagination, SearchCriteria, SearchError, SearchOperation, SortOrder,
};

/// Value kind of a searchable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    /// Stored as RFC 3339 text; filtered by calendar day (`YYYY-MM-DD`)
    Timestamp,
}

/// A searchable field: SQL expression and value kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub expr: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn text(expr: &'static str) -> Self {
        Self { expr, kind: FieldKind::Text }
    }

    pub const fn integer(expr: &'static str) -> Self {
        Self { expr, kind: FieldKind::Integer }
    }

    pub const fn timestamp(expr: &'static str) -> Self {
        Self { expr, kind: FieldKind::Timestamp }
    }
}

/// An entity that can be listed through `fetch_page`
pub trait SearchableEntity: Sized + Send + Unpin {
    /// Table the entity is read from
    const TABLE: &'static str;

    /// Column list of the select, matching what `from_row` reads
    const COLUMNS: &'static str;

    /// API field name to SQL mapping
    const FIELDS: &'static [(&'static str, Field)];

    fn from_row(row: &SqliteRow) -> Result<Self>;

    fn field(name: &str) -> Option<Field> {
        Self::FIELDS
            .iter()
            .find(|(field_name, _)| *field_name == name)
            .map(|(_, field)| *field)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    expr: String,
    operation: SearchOperation,
    value: BindValue,
}

/// A criteria model validated against one entity's field whitelist
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    table: &'static str,
    columns: &'static str,
    conditions: Vec<Condition>,
    order_by: Vec<(&'static str, SortOrder)>,
    pagination: Pagination,
}

impl CompiledQuery {
    /// Validate `criteria` against the fields of `E`
    pub fn compile<E: SearchableEntity>(criteria: &SearchCriteria) -> Result<Self, SearchError> {
        let mut conditions = Vec::with_capacity(criteria.criteria.len());
        for criterion in &criteria.criteria {
            let field = E::field(&criterion.field)
                .ok_or_else(|| SearchError::UnknownField(criterion.field.clone()))?;
            conditions.push(compile_condition(
                &criterion.field,
                field,
                criterion.operation,
                &criterion.value,
            )?);
        }

        let mut order_by = Vec::with_capacity(criteria.sorting.len() + 1);
        let mut has_id = false;
        for sorting in &criteria.sorting {
            let field = E::field(&sorting.field)
                .ok_or_else(|| SearchError::UnknownField(sorting.field.clone()))?;
            has_id |= sorting.field == "id";
            order_by.push((field.expr, sorting.order));
        }
        if !has_id {
            order_by.push(("id", SortOrder::Asc));
        }

        Ok(Self {
            table: E::TABLE,
            columns: E::COLUMNS,
            conditions,
            order_by,
            pagination: criteria.pagination,
        })
    }

    fn push_where<'a>(&self, qb: &mut QueryBuilder<'a, Sqlite>) {
        for (i, condition) in self.conditions.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(&condition.expr);
            qb.push(" ");
            qb.push(condition.operation.as_sql());
            qb.push(" ");
            match &condition.value {
                BindValue::Text(text) => qb.push_bind(text.clone()),
                BindValue::Integer(number) => qb.push_bind(*number),
            };
            if condition.operation == SearchOperation::Like {
                qb.push(" ESCAPE '\\'");
            }
        }
    }

    fn count_query(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
        qb.push(self.table);
        self.push_where(&mut qb);
        qb
    }

    fn select_query(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(self.columns);
        qb.push(" FROM ");
        qb.push(self.table);
        self.push_where(&mut qb);

        qb.push(" ORDER BY ");
        for (i, (expr, order)) in self.order_by.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*expr);
            qb.push(" ");
            qb.push(order.as_sql());
        }

        qb.push(" LIMIT ");
        qb.push_bind(self.pagination.limit());
        qb.push(" OFFSET ");
        qb.push_bind(self.pagination.offset());
        qb
    }
}

fn compile_condition(
    name: &str,
    field: Field,
    operation: SearchOperation,
    value: &str,
) -> Result<Condition, SearchError> {
    let invalid = |reason: &str| SearchError::InvalidValue {
        field: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if operation == SearchOperation::Like && field.kind != FieldKind::Text {
        return Err(invalid("LIKE only applies to text fields"));
    }

    let (expr, value) = match field.kind {
        FieldKind::Text => {
            let value = if operation == SearchOperation::Like {
                format!("%{}%", escape_like(value))
            } else {
                value.to_string()
            };
            (field.expr.to_string(), BindValue::Text(value))
        }
        FieldKind::Integer => {
            let number = value
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid("expected an integer"))?;
            (field.expr.to_string(), BindValue::Integer(number))
        }
        FieldKind::Timestamp => {
            let day = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .map_err(|_| invalid("expected a date as YYYY-MM-DD"))?;
            (
                format!("substr({}, 1, 10)", field.expr),
                BindValue::Text(day.format("%Y-%m-%d").to_string()),
            )
        }
    };

    Ok(Condition {
        expr,
        operation,
        value,
    })
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Run a compiled query and return the requested page
///
/// A page past the end yields an empty entity list with the real page count.
pub async fn fetch_page<E: SearchableEntity>(
    conn: &mut SqliteConnection,
    query: &CompiledQuery,
) -> Result<Page<E>> {
    let total: i64 = query
        .count_query()
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("Failed to count rows in {}", query.table))?;

    let mut select = query.select_query();
    tracing::debug!("Search query: {}", select.sql());

    let rows = select
        .build()
        .fetch_all(&mut *conn)
        .await
        .with_context(|| format!("Failed to search {}", query.table))?;

    let mut entities = Vec::with_capacity(rows.len());
    for row in &rows {
        entities.push(E::from_row(row)?);
    }

    Ok(Page::new(
        entities,
        query.pagination.page,
        page_count(total.max(0) as u64, query.pagination.page_size),
    ))
}
