//! Typed, parameterized statements over the `resources` table
//!
//! SQL text is assembled only from the static column names below; every
//! caller-supplied value travels as a positional parameter.

use crate::graph::ShareLevel;
use rusqlite::types::Value;

/// Persisted element properties usable in a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Uri,
    Owner,
    Kind,
    Label,
    Comment,
    Images,
    CreationDate,
    LastModificationDate,
    ShareLevel,
    LastCenterDate,
    NumberOfVisits,
    NbReferences,
    Colors,
    ChildrenIndexes,
    ExternalUri,
    IsPattern,
    PrivateContext,
    PublicContext,
}

impl Column {
    /// Property name as stored
    pub fn name(self) -> &'static str {
        match self {
            Column::Uri => "uri",
            Column::Owner => "owner",
            Column::Kind => "kind",
            Column::Label => "label",
            Column::Comment => "comment",
            Column::Images => "images",
            Column::CreationDate => "creation_date",
            Column::LastModificationDate => "last_modification_date",
            Column::ShareLevel => "shareLevel",
            Column::LastCenterDate => "last_center_date",
            Column::NumberOfVisits => "number_of_visits",
            Column::NbReferences => "nb_references",
            Column::Colors => "colors",
            Column::ChildrenIndexes => "childrenIndexes",
            Column::ExternalUri => "external_uri",
            Column::IsPattern => "is_pattern",
            Column::PrivateContext => "private_context",
            Column::PublicContext => "public_context",
        }
    }

    /// Expression used when filtering on this column.
    ///
    /// A missing `shareLevel` compares as private.
    fn filter_expr(self) -> &'static str {
        match self {
            Column::ShareLevel => "COALESCE(shareLevel, 10)",
            other => other.name(),
        }
    }
}

/// A filter on one column
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Column, Value),
    In(Column, Vec<Value>),
    NotNull(Column),
}

impl Predicate {
    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Predicate::Eq(column, value.into())
    }

    pub fn share_level_in(levels: &[ShareLevel]) -> Self {
        Predicate::In(
            Column::ShareLevel,
            levels.iter().map(|l| Value::Integer(l.index())).collect(),
        )
    }

    pub fn owner_in<S: AsRef<str>>(owners: &[S]) -> Self {
        Predicate::In(
            Column::Owner,
            owners
                .iter()
                .map(|o| Value::Text(o.as_ref().to_string()))
                .collect(),
        )
    }

    fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Predicate::Eq(column, value) => {
                sql.push_str(column.filter_expr());
                sql.push_str(" = ?");
                params.push(value.clone());
            }
            // An empty set matches nothing
            Predicate::In(_, values) if values.is_empty() => sql.push_str("0 = 1"),
            Predicate::In(column, values) => {
                sql.push_str(column.filter_expr());
                sql.push_str(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    params.push(value.clone());
                }
                sql.push(')');
            }
            Predicate::NotNull(column) => {
                sql.push_str(column.name());
                sql.push_str(" IS NOT NULL");
            }
        }
    }
}

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Builder for a paged `SELECT` over graph elements
#[derive(Debug, Clone)]
pub struct SelectQuery {
    columns: Vec<Column>,
    predicates: Vec<Predicate>,
    order_desc: Option<Column>,
    skip: usize,
    limit: Option<usize>,
}

impl SelectQuery {
    pub fn resources(columns: &[Column]) -> Self {
        Self {
            columns: columns.to_vec(),
            predicates: Vec::new(),
            order_desc: None,
            skip: 0,
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Order descending on `column`; ties are broken by uri so pages are stable
    pub fn order_by_desc(mut self, column: Column) -> Self {
        self.order_desc = Some(column);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> BuiltQuery {
        let mut sql = String::from("SELECT ");
        let mut params = Vec::new();

        let names: Vec<&str> = self.columns.iter().map(|c| c.name()).collect();
        sql.push_str(&names.join(", "));
        sql.push_str(" FROM resources");

        for (i, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            predicate.render(&mut sql, &mut params);
        }

        if let Some(column) = self.order_desc {
            sql.push_str(" ORDER BY ");
            sql.push_str(column.name());
            sql.push_str(" DESC, uri ASC");
        }

        if self.limit.is_some() || self.skip > 0 {
            // SQLite reads a negative limit as "no limit"
            let limit = self.limit.map(|l| l as i64).unwrap_or(-1);
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(limit));
            params.push(Value::Integer(self.skip as i64));
        }

        BuiltQuery { sql, params }
    }
}
