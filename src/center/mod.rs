//! Centered elements: what users focused on, ranked by recency
//!
//! An element becomes eligible once it has been centered. Every ranking
//! variant returns one page ordered by `last_center_date`, newest first,
//! and differs only in which owners and share levels it admits.

use crate::graph::{
    from_millis, now_millis, CenterContext, CenteredElement, Colors, FriendshipStatus, GraphError,
    GraphResult, ShareLevel, Uri,
};
use crate::storage::{
    json_column, Column, Predicate, SelectQuery, Session, SqliteStore, StorageError, TextProperty,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use std::sync::Arc;
use tracing::debug;

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: usize = 28;

/// Which breadcrumb context a variant exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextScope {
    Private,
    Public,
}

impl ContextScope {
    fn column(self) -> Column {
        match self {
            ContextScope::Private => Column::PrivateContext,
            ContextScope::Public => Column::PublicContext,
        }
    }
}

/// Paged ranking queries over centered elements
#[derive(Clone)]
pub struct CenteredElementsQuery {
    store: Arc<SqliteStore>,
    skip: usize,
    limit: usize,
}

impl CenteredElementsQuery {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self {
            store,
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }

    /// Number of leading results to drop
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Maximum number of results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Everything `user` owns, whatever its share level
    pub fn for_owner(&self, user: &str) -> GraphResult<Vec<CenteredElement>> {
        self.run(
            ContextScope::Private,
            vec![Predicate::eq(Column::Owner, user.to_string())],
        )
    }

    pub fn all_public(&self) -> GraphResult<Vec<CenteredElement>> {
        self.run(
            ContextScope::Public,
            vec![Predicate::share_level_in(&[ShareLevel::Public])],
        )
    }

    pub fn public_of_user(&self, user: &str) -> GraphResult<Vec<CenteredElement>> {
        self.run(
            ContextScope::Public,
            vec![
                Predicate::eq(Column::Owner, user.to_string()),
                Predicate::share_level_in(&[ShareLevel::Public]),
            ],
        )
    }

    /// Public patterns of any owner
    pub fn all_patterns(&self) -> GraphResult<Vec<CenteredElement>> {
        self.run(
            ContextScope::Public,
            vec![
                Predicate::eq(Column::IsPattern, 1i64),
                Predicate::share_level_in(&[ShareLevel::Public]),
            ],
        )
    }

    /// Friends-or-public elements of every confirmed friend of `user`.
    ///
    /// The user's own elements are not part of the feed.
    pub fn friends_feed(&self, user: &str) -> GraphResult<Vec<CenteredElement>> {
        self.store.with_session(|s| {
            let friends = s.confirmed_friends(user)?;
            debug!(user, friends = friends.len(), "resolved friends");
            self.select(
                s,
                ContextScope::Public,
                vec![
                    Predicate::owner_in(&friends),
                    Predicate::share_level_in(&[ShareLevel::Friends, ShareLevel::Public]),
                ],
            )
        })
    }

    /// Friends-or-public elements of one user, as seen by a friend
    pub fn for_a_friend(&self, friend: &str) -> GraphResult<Vec<CenteredElement>> {
        self.run(
            ContextScope::Public,
            vec![
                Predicate::eq(Column::Owner, friend.to_string()),
                Predicate::share_level_in(&[ShareLevel::Friends, ShareLevel::Public]),
            ],
        )
    }

    fn run(
        &self,
        scope: ContextScope,
        predicates: Vec<Predicate>,
    ) -> GraphResult<Vec<CenteredElement>> {
        self.store
            .with_session(|s| self.select(s, scope, predicates))
    }

    fn select(
        &self,
        s: &Session<'_>,
        scope: ContextScope,
        predicates: Vec<Predicate>,
    ) -> GraphResult<Vec<CenteredElement>> {
        let query = predicates
            .into_iter()
            .fold(
                SelectQuery::resources(&[
                    Column::Uri,
                    Column::Label,
                    Column::NumberOfVisits,
                    Column::LastCenterDate,
                    Column::NbReferences,
                    scope.column(),
                    Column::Colors,
                    Column::ShareLevel,
                    Column::IsPattern,
                ])
                .filter(Predicate::NotNull(Column::LastCenterDate)),
                SelectQuery::filter,
            )
            .order_by_desc(Column::LastCenterDate)
            .skip(self.skip)
            .limit(self.limit)
            .build();

        let rows = s.select(&query, |row| {
            let share_level = match row.get::<_, Option<i64>>(7)? {
                None => ShareLevel::default(),
                Some(index) => ShareLevel::from_index(index).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        7,
                        Type::Integer,
                        Box::new(StorageError::InvalidShareLevel(index)),
                    )
                })?,
            };
            Ok(CenteredElement {
                uri: Uri::from(row.get::<_, String>(0)?),
                label: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                number_of_visits: row.get::<_, Option<i64>>(2)?.unwrap_or(0).max(0) as u32,
                last_center_date: from_millis(row.get(3)?),
                nb_references: row.get::<_, Option<i64>>(4)?.map(|n| n.max(0) as u32),
                context: json_column::<CenterContext>(row, 5)?.unwrap_or_default(),
                colors: json_column::<Colors>(row, 6)?.unwrap_or_default(),
                share_level,
                is_pattern: row.get(8)?,
            })
        })?;
        Ok(rows)
    }
}

/// Records focus events and breadcrumb contexts
pub struct CenterOperator {
    store: Arc<SqliteStore>,
}

impl CenterOperator {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Center on an element now
    pub fn center(&self, uri: &Uri) -> GraphResult<()> {
        self.center_at(uri, now_millis())
    }

    /// Center on an element at a given time and count the visit
    pub fn center_at(&self, uri: &Uri, date: DateTime<Utc>) -> GraphResult<()> {
        self.store.with_session(|s| {
            if !s.center(uri, date)? {
                return Err(GraphError::ElementNotFound(uri.clone()));
            }
            debug!(%uri, "centered");
            Ok(())
        })
    }

    pub fn set_private_context(&self, uri: &Uri, context: &CenterContext) -> GraphResult<()> {
        self.set_context(uri, TextProperty::PrivateContext, context)
    }

    pub fn set_public_context(&self, uri: &Uri, context: &CenterContext) -> GraphResult<()> {
        self.set_context(uri, TextProperty::PublicContext, context)
    }

    /// Forget that an element was ever centered
    pub fn remove_center(&self, uri: &Uri) -> GraphResult<()> {
        self.store.with_session(|s| {
            if !s.remove_center(uri)? {
                return Err(GraphError::ElementNotFound(uri.clone()));
            }
            Ok(())
        })
    }

    fn set_context(
        &self,
        uri: &Uri,
        property: TextProperty,
        context: &CenterContext,
    ) -> GraphResult<()> {
        let json = serde_json::to_string(context).map_err(StorageError::from)?;
        self.store.with_session(|s| {
            if !s.update_text(uri, property, Some(&json))? {
                return Err(GraphError::ElementNotFound(uri.clone()));
            }
            Ok(())
        })
    }
}

/// Friendships between users
pub struct Friendships {
    store: Arc<SqliteStore>,
}

impl Friendships {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Set the status between two users; the relation is symmetric
    pub fn set_friendship(&self, a: &str, b: &str, status: FriendshipStatus) -> GraphResult<()> {
        if a == b {
            return Err(GraphError::InvariantViolation(format!(
                "{} cannot befriend themselves",
                a
            )));
        }
        Ok(self
            .store
            .with_session(|s| s.set_friendship(a, b, status))?)
    }

    pub fn confirmed_friends(&self, user: &str) -> GraphResult<Vec<String>> {
        Ok(self.store.with_session(|s| s.confirmed_friends(user))?)
    }
}
