//! Scoped session: the typed primitives engines issue against the store

use super::statement::BuiltQuery;
use super::traits::{RelationKind, StorageError, StorageResult};
use crate::graph::{
    default_relation_external_uri, from_millis, now_millis, ElementKind, FriendlyResource,
    FriendshipStatus, GraphElement, Identifier, Image, IncludedEdge, IncludedElement, ShareLevel,
    SortDates, Uri,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, OptionalExtension, Row, Transaction};
use serde::de::DeserializeOwned;

const ELEMENT_COLUMNS: &str =
    "uri, label, comment, images, creation_date, last_modification_date, shareLevel";

const IDENTIFIER_COLUMNS: &str = "i.uri, i.label, i.comment, i.images, i.creation_date, \
     i.last_modification_date, i.external_uri, i.nb_references";

/// Free-text properties that can be read and written one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextProperty {
    Label,
    Comment,
    Images,
    Colors,
    ChildrenIndexes,
    PrivateContext,
    PublicContext,
}

impl TextProperty {
    fn column(self) -> &'static str {
        match self {
            TextProperty::Label => "label",
            TextProperty::Comment => "comment",
            TextProperty::Images => "images",
            TextProperty::Colors => "colors",
            TextProperty::ChildrenIndexes => "childrenIndexes",
            TextProperty::PrivateContext => "private_context",
            TextProperty::PublicContext => "public_context",
        }
    }

    // Static statement text per property keeps caller data out of SQL
    fn update_sql(self) -> &'static str {
        match self {
            TextProperty::Label => {
                "UPDATE resources SET label = ?2, last_modification_date = ?3 WHERE uri = ?1"
            }
            TextProperty::Comment => {
                "UPDATE resources SET comment = ?2, last_modification_date = ?3 WHERE uri = ?1"
            }
            TextProperty::Images => {
                "UPDATE resources SET images = ?2, last_modification_date = ?3 WHERE uri = ?1"
            }
            TextProperty::Colors => {
                "UPDATE resources SET colors = ?2, last_modification_date = ?3 WHERE uri = ?1"
            }
            TextProperty::ChildrenIndexes => {
                "UPDATE resources SET childrenIndexes = ?2, last_modification_date = ?3 WHERE uri = ?1"
            }
            TextProperty::PrivateContext => {
                "UPDATE resources SET private_context = ?2, last_modification_date = ?3 WHERE uri = ?1"
            }
            TextProperty::PublicContext => {
                "UPDATE resources SET public_context = ?2, last_modification_date = ?3 WHERE uri = ?1"
            }
        }
    }
}

/// An edge element together with the two vertices it links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeEndpoints {
    pub edge: Uri,
    pub source: Uri,
    pub destination: Uri,
}

/// One open transaction against the store.
///
/// Obtained through [`SqliteStore::with_session`](super::SqliteStore::with_session);
/// never outlives the closure it is handed to.
pub struct Session<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> Session<'conn> {
    pub(super) fn new(tx: Transaction<'conn>) -> Self {
        Self { tx }
    }

    pub(super) fn commit(self) -> StorageResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    // === Elements ===

    pub fn insert_element(&self, kind: ElementKind, element: &GraphElement) -> StorageResult<()> {
        let resource = &element.resource;
        self.tx.execute(
            r#"
            INSERT INTO resources (uri, owner, kind, label, comment, images,
                                   creation_date, last_modification_date, shareLevel)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                resource.uri.as_str(),
                resource.owner_username().unwrap_or_default(),
                kind.as_str(),
                resource.label,
                resource.comment,
                serde_json::to_string(&resource.images)?,
                resource.creation_date.timestamp_millis(),
                resource.last_modification_date.timestamp_millis(),
                element.share_level.index(),
            ],
        )?;
        Ok(())
    }

    pub fn element(&self, uri: &Uri) -> StorageResult<Option<GraphElement>> {
        let sql = format!("SELECT {} FROM resources WHERE uri = ?1", ELEMENT_COLUMNS);
        Ok(self
            .tx
            .query_row(&sql, params![uri.as_str()], |row| element_from_row(row, 0))
            .optional()?)
    }

    pub fn element_kind(&self, uri: &Uri) -> StorageResult<Option<ElementKind>> {
        let kind: Option<String> = self
            .tx
            .query_row(
                "SELECT kind FROM resources WHERE uri = ?1",
                params![uri.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(kind.as_deref().and_then(ElementKind::parse))
    }

    /// Uris of every element of `kind`, optionally restricted to one owner
    pub fn uris_of_kind(&self, kind: ElementKind, owner: Option<&str>) -> StorageResult<Vec<Uri>> {
        let mut stmt = self.tx.prepare(
            "SELECT uri FROM resources WHERE kind = ?1 AND (?2 IS NULL OR owner = ?2) ORDER BY uri",
        )?;
        let uris = stmt
            .query_map(params![kind.as_str(), owner], |row| {
                row.get::<_, String>(0).map(Uri::from)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(uris)
    }

    pub fn count_resources(&self) -> StorageResult<i64> {
        Ok(self
            .tx
            .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?)
    }

    /// Write one text property. Returns false when the element is absent.
    pub fn update_text(
        &self,
        uri: &Uri,
        property: TextProperty,
        value: Option<&str>,
    ) -> StorageResult<bool> {
        let changed = self.tx.execute(
            property.update_sql(),
            params![uri.as_str(), value, now_millis().timestamp_millis()],
        )?;
        Ok(changed > 0)
    }

    /// Read one text property. `None` when the element is absent,
    /// `Some(None)` when the property is unset.
    pub fn text_property(
        &self,
        uri: &Uri,
        property: TextProperty,
    ) -> StorageResult<Option<Option<String>>> {
        let sql = format!("SELECT {} FROM resources WHERE uri = ?1", property.column());
        Ok(self
            .tx
            .query_row(&sql, params![uri.as_str()], |row| row.get(0))
            .optional()?)
    }

    pub fn set_share_level(&self, uri: &Uri, level: ShareLevel) -> StorageResult<bool> {
        let changed = self.tx.execute(
            "UPDATE resources SET shareLevel = ?2, last_modification_date = ?3 WHERE uri = ?1",
            params![uri.as_str(), level.index(), now_millis().timestamp_millis()],
        )?;
        Ok(changed > 0)
    }

    pub fn set_pattern(&self, uri: &Uri, is_pattern: bool) -> StorageResult<bool> {
        let changed = self.tx.execute(
            "UPDATE resources SET is_pattern = ?2 WHERE uri = ?1",
            params![uri.as_str(), is_pattern],
        )?;
        Ok(changed > 0)
    }

    /// Write the position dates of an element. Returns false when the element is absent.
    pub fn set_sort_date(
        &self,
        uri: &Uri,
        sort_date: DateTime<Utc>,
        move_date: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let changed = self.tx.execute(
            r#"
            UPDATE resources
            SET sort_date = ?2, move_date = ?3, last_modification_date = ?4
            WHERE uri = ?1
            "#,
            params![
                uri.as_str(),
                sort_date.timestamp_millis(),
                move_date.timestamp_millis(),
                now_millis().timestamp_millis()
            ],
        )?;
        Ok(changed > 0)
    }

    /// Position dates of an element; `None` when the element is absent
    pub fn sort_date(&self, uri: &Uri) -> StorageResult<Option<SortDates>> {
        Ok(self
            .tx
            .query_row(
                "SELECT sort_date, move_date FROM resources WHERE uri = ?1",
                params![uri.as_str()],
                |row| {
                    Ok(SortDates {
                        sort_date: row.get::<_, Option<i64>>(0)?.map(from_millis),
                        move_date: row.get::<_, Option<i64>>(1)?.map(from_millis),
                    })
                },
            )
            .optional()?)
    }

    /// Delete a resource and every relation touching it
    pub fn delete_resource(&self, uri: &Uri) -> StorageResult<bool> {
        self.tx.execute(
            "DELETE FROM relations WHERE from_uri = ?1 OR to_uri = ?1",
            params![uri.as_str()],
        )?;
        let deleted = self
            .tx
            .execute("DELETE FROM resources WHERE uri = ?1", params![uri.as_str()])?;
        Ok(deleted > 0)
    }

    // === Identifiers ===

    pub fn insert_identifier(&self, identifier: &Identifier) -> StorageResult<()> {
        let resource = &identifier.resource;
        self.tx.execute(
            r#"
            INSERT INTO resources (uri, owner, kind, label, comment, images,
                                   creation_date, last_modification_date,
                                   external_uri, nb_references)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                resource.uri.as_str(),
                resource.owner_username().unwrap_or_default(),
                ElementKind::Meta.as_str(),
                resource.label,
                resource.comment,
                serde_json::to_string(&resource.images)?,
                resource.creation_date.timestamp_millis(),
                resource.last_modification_date.timestamp_millis(),
                identifier.external_resource_uri.as_str(),
                identifier.nb_references,
            ],
        )?;
        Ok(())
    }

    /// Load an identifier node; its relation is the default one since no
    /// tagging edge is involved.
    pub fn identifier(&self, uri: &Uri) -> StorageResult<Option<Identifier>> {
        let sql = format!(
            "SELECT {}, NULL FROM resources i WHERE i.uri = ?1 AND i.kind = 'meta'",
            IDENTIFIER_COLUMNS
        );
        Ok(self
            .tx
            .query_row(&sql, params![uri.as_str()], identifier_from_row)
            .optional()?)
    }

    /// Oldest identifier standing for `external_uri`, anywhere in the store
    pub fn identifier_by_external_uri(&self, external_uri: &Uri) -> StorageResult<Option<Identifier>> {
        let sql = format!(
            "SELECT {}, NULL FROM resources i \
             WHERE i.kind = 'meta' AND i.external_uri = ?1 \
             ORDER BY i.creation_date ASC, i.uri ASC LIMIT 1",
            IDENTIFIER_COLUMNS
        );
        Ok(self
            .tx
            .query_row(&sql, params![external_uri.as_str()], identifier_from_row)
            .optional()?)
    }

    /// Tags currently on an element, each carrying its edge's relation
    pub fn tags_of(&self, element: &Uri) -> StorageResult<Vec<Identifier>> {
        let sql = format!(
            "SELECT {}, r.relation_external_uri FROM relations r \
             JOIN resources i ON i.uri = r.to_uri \
             WHERE r.from_uri = ?1 AND r.kind = ?2 \
             ORDER BY i.external_uri, i.uri",
            IDENTIFIER_COLUMNS
        );
        let mut stmt = self.tx.prepare(&sql)?;
        let tags = stmt
            .query_map(
                params![element.as_str(), RelationKind::IdentifiedTo.as_str()],
                identifier_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    /// The tag on `element` standing for `external_uri`, if any
    pub fn tag_for_external_uri(
        &self,
        element: &Uri,
        external_uri: &Uri,
    ) -> StorageResult<Option<Identifier>> {
        let sql = format!(
            "SELECT {}, r.relation_external_uri FROM relations r \
             JOIN resources i ON i.uri = r.to_uri \
             WHERE r.from_uri = ?1 AND r.kind = ?2 AND i.external_uri = ?3 \
             ORDER BY i.uri LIMIT 1",
            IDENTIFIER_COLUMNS
        );
        Ok(self
            .tx
            .query_row(
                &sql,
                params![
                    element.as_str(),
                    RelationKind::IdentifiedTo.as_str(),
                    external_uri.as_str()
                ],
                identifier_from_row,
            )
            .optional()?)
    }

    /// Atomically add `delta` to an identifier's reference count.
    ///
    /// Returns the new count, or `None` when the identifier is absent or the
    /// count would drop below zero; nothing is written in that case.
    pub fn add_to_nb_references(&self, uri: &Uri, delta: i64) -> StorageResult<Option<u32>> {
        let count: Option<i64> = self
            .tx
            .query_row(
                r#"
                UPDATE resources
                SET nb_references = COALESCE(nb_references, 0) + ?2
                WHERE uri = ?1 AND kind = 'meta' AND COALESCE(nb_references, 0) + ?2 >= 0
                RETURNING nb_references
                "#,
                params![uri.as_str(), delta],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.map(|c| c as u32))
    }

    pub fn nb_references(&self, uri: &Uri) -> StorageResult<Option<u32>> {
        let count: Option<Option<i64>> = self
            .tx
            .query_row(
                "SELECT nb_references FROM resources WHERE uri = ?1 AND kind = 'meta'",
                params![uri.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.map(|c| c.unwrap_or(0) as u32))
    }

    pub fn set_nb_references(&self, uri: &Uri, count: u32) -> StorageResult<bool> {
        let changed = self.tx.execute(
            "UPDATE resources SET nb_references = ?2 WHERE uri = ?1 AND kind = 'meta'",
            params![uri.as_str(), count],
        )?;
        Ok(changed > 0)
    }

    pub fn identifiers_with_zero_references(&self) -> StorageResult<Vec<Uri>> {
        let mut stmt = self.tx.prepare(
            "SELECT uri FROM resources WHERE kind = 'meta' AND COALESCE(nb_references, 0) = 0 ORDER BY uri",
        )?;
        let uris = stmt
            .query_map([], |row| row.get::<_, String>(0).map(Uri::from))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(uris)
    }

    // === Relations ===

    /// Create a relation, or update its relation uri if it already exists
    pub fn link(
        &self,
        from: &Uri,
        kind: RelationKind,
        to: &Uri,
        relation_external_uri: Option<&Uri>,
    ) -> StorageResult<()> {
        self.tx.execute(
            r#"
            INSERT INTO relations (from_uri, kind, to_uri, relation_external_uri)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(from_uri, kind, to_uri) DO UPDATE SET
                relation_external_uri = excluded.relation_external_uri
            "#,
            params![
                from.as_str(),
                kind.as_str(),
                to.as_str(),
                relation_external_uri.map(|u| u.as_str())
            ],
        )?;
        Ok(())
    }

    pub fn unlink(&self, from: &Uri, kind: RelationKind, to: &Uri) -> StorageResult<bool> {
        let deleted = self.tx.execute(
            "DELETE FROM relations WHERE from_uri = ?1 AND kind = ?2 AND to_uri = ?3",
            params![from.as_str(), kind.as_str(), to.as_str()],
        )?;
        Ok(deleted > 0)
    }

    pub fn targets(&self, from: &Uri, kind: RelationKind) -> StorageResult<Vec<Uri>> {
        let mut stmt = self.tx.prepare(
            "SELECT to_uri FROM relations WHERE from_uri = ?1 AND kind = ?2 ORDER BY to_uri",
        )?;
        let uris = stmt
            .query_map(params![from.as_str(), kind.as_str()], |row| {
                row.get::<_, String>(0).map(Uri::from)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(uris)
    }

    pub fn count_relations_to(&self, to: &Uri, kind: RelationKind) -> StorageResult<u32> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM relations WHERE to_uri = ?1 AND kind = ?2",
            params![to.as_str(), kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    /// Vertices contained in a group vertex, with their labels
    pub fn included_vertices(&self, group: &Uri) -> StorageResult<Vec<IncludedElement>> {
        let mut stmt = self.tx.prepare(
            "SELECT n.uri, n.label FROM relations r JOIN resources n ON n.uri = r.to_uri \
             WHERE r.from_uri = ?1 AND r.kind = ?2 ORDER BY n.uri",
        )?;
        let included = stmt
            .query_map(
                params![group.as_str(), RelationKind::IncludedVertex.as_str()],
                |row| included_from_row(row, 0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(included)
    }

    /// Edges contained in a group vertex, each with its source and destination vertex
    pub fn included_edges(&self, group: &Uri) -> StorageResult<Vec<IncludedEdge>> {
        let mut stmt = self.tx.prepare(
            r#"
            SELECT e.uri, e.label, sv.uri, sv.label, dv.uri, dv.label
            FROM relations r
            JOIN resources e ON e.uri = r.to_uri
            JOIN relations s ON s.from_uri = e.uri AND s.kind = ?3
            JOIN resources sv ON sv.uri = s.to_uri
            JOIN relations d ON d.from_uri = e.uri AND d.kind = ?4
            JOIN resources dv ON dv.uri = d.to_uri
            WHERE r.from_uri = ?1 AND r.kind = ?2
            ORDER BY e.uri
            "#,
        )?;
        let included = stmt
            .query_map(
                params![
                    group.as_str(),
                    RelationKind::IncludedEdge.as_str(),
                    RelationKind::SourceVertex.as_str(),
                    RelationKind::DestinationVertex.as_str()
                ],
                |row| {
                    let edge = included_from_row(row, 0)?;
                    Ok(IncludedEdge {
                        uri: edge.uri,
                        label: edge.label,
                        source_vertex: included_from_row(row, 2)?,
                        destination_vertex: included_from_row(row, 4)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(included)
    }

    /// Edge elements having `vertex` as source or destination
    pub fn incident_edges(&self, vertex: &Uri) -> StorageResult<Vec<EdgeEndpoints>> {
        let mut stmt = self.tx.prepare(
            r#"
            SELECT s.from_uri, s.to_uri, d.to_uri
            FROM relations s
            JOIN relations d ON d.from_uri = s.from_uri AND d.kind = ?3
            WHERE s.kind = ?2 AND (s.to_uri = ?1 OR d.to_uri = ?1)
            ORDER BY s.from_uri
            "#,
        )?;
        let edges = stmt
            .query_map(
                params![
                    vertex.as_str(),
                    RelationKind::SourceVertex.as_str(),
                    RelationKind::DestinationVertex.as_str()
                ],
                |row| {
                    Ok(EdgeEndpoints {
                        edge: Uri::from(row.get::<_, String>(0)?),
                        source: Uri::from(row.get::<_, String>(1)?),
                        destination: Uri::from(row.get::<_, String>(2)?),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    // === Centering ===

    /// Mark an element as focused at `date` and count the visit
    pub fn center(&self, uri: &Uri, date: DateTime<Utc>) -> StorageResult<bool> {
        let changed = self.tx.execute(
            r#"
            UPDATE resources
            SET last_center_date = ?2,
                number_of_visits = COALESCE(number_of_visits, 0) + 1
            WHERE uri = ?1
            "#,
            params![uri.as_str(), date.timestamp_millis()],
        )?;
        Ok(changed > 0)
    }

    pub fn remove_center(&self, uri: &Uri) -> StorageResult<bool> {
        let changed = self.tx.execute(
            "UPDATE resources SET last_center_date = NULL, number_of_visits = NULL WHERE uri = ?1",
            params![uri.as_str()],
        )?;
        Ok(changed > 0)
    }

    // === Friendships ===

    pub fn set_friendship(&self, a: &str, b: &str, status: FriendshipStatus) -> StorageResult<()> {
        let (user_a, user_b) = if a <= b { (a, b) } else { (b, a) };
        self.tx.execute(
            r#"
            INSERT INTO friendships (user_a, user_b, status) VALUES (?1, ?2, ?3)
            ON CONFLICT(user_a, user_b) DO UPDATE SET status = excluded.status
            "#,
            params![user_a, user_b, status.as_str()],
        )?;
        Ok(())
    }

    /// Usernames with a confirmed friendship with `user`
    pub fn confirmed_friends(&self, user: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self.tx.prepare(
            r#"
            SELECT CASE WHEN user_a = ?1 THEN user_b ELSE user_a END AS friend
            FROM friendships
            WHERE (user_a = ?1 OR user_b = ?1) AND status = ?2
            ORDER BY friend
            "#,
        )?;
        let friends = stmt
            .query_map(params![user, FriendshipStatus::Confirmed.as_str()], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(friends)
    }

    // === Built statements ===

    pub fn select<T>(
        &self,
        query: &BuiltQuery,
        mut f: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StorageResult<Vec<T>> {
        let mut stmt = self.tx.prepare(&query.sql)?;
        let rows = stmt
            .query_map(params_from_iter(query.params.iter()), |row| f(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Map `ELEMENT_COLUMNS` starting at `offset`
fn element_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<GraphElement> {
    let share_level = match row.get::<_, Option<i64>>(offset + 6)? {
        None => ShareLevel::default(),
        Some(index) => ShareLevel::from_index(index).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 6,
                Type::Integer,
                Box::new(StorageError::InvalidShareLevel(index)),
            )
        })?,
    };
    Ok(GraphElement {
        resource: resource_from_row(row, offset)?,
        share_level,
    })
}

fn identifier_from_row(row: &Row<'_>) -> rusqlite::Result<Identifier> {
    let relation: Option<String> = row.get(8)?;
    Ok(Identifier {
        resource: resource_from_row(row, 0)?,
        external_resource_uri: Uri::from(row.get::<_, Option<String>>(6)?.unwrap_or_default()),
        relation_external_resource_uri: relation
            .map(Uri::from)
            .unwrap_or_else(default_relation_external_uri),
        nb_references: row.get::<_, Option<i64>>(7)?.unwrap_or(0).max(0) as u32,
    })
}

fn resource_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<FriendlyResource> {
    Ok(FriendlyResource {
        uri: Uri::from(row.get::<_, String>(offset)?),
        label: row.get::<_, Option<String>>(offset + 1)?.unwrap_or_default(),
        comment: row.get::<_, Option<String>>(offset + 2)?.unwrap_or_default(),
        images: json_column::<Vec<Image>>(row, offset + 3)?.unwrap_or_default(),
        creation_date: from_millis(row.get(offset + 4)?),
        last_modification_date: from_millis(row.get(offset + 5)?),
    })
}

/// Map a `(uri, label)` column pair starting at `offset`
fn included_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<IncludedElement> {
    Ok(IncludedElement {
        uri: Uri::from(row.get::<_, String>(offset)?),
        label: row.get::<_, Option<String>>(offset + 1)?.unwrap_or_default(),
    })
}

/// Decode a JSON text column; `None` when the column is NULL
pub(crate) fn json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        serde_json::from_str(&t)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OpenStore, SqliteStore};
    use crate::graph::UserUris;

    fn identifier(owner: &str, external: &str) -> Identifier {
        Identifier {
            resource: FriendlyResource::new(UserUris::new(owner).generate_identifier_uri())
                .with_label("tag"),
            external_resource_uri: Uri::from(external),
            relation_external_resource_uri: default_relation_external_uri(),
            nb_references: 0,
        }
    }

    #[test]
    fn reference_count_never_goes_negative() {
        let store = SqliteStore::open_in_memory().unwrap();
        let tag = identifier("roger", "https://example.org/x");
        store
            .with_session(|s| {
                s.insert_identifier(&tag)?;
                assert_eq!(s.add_to_nb_references(tag.uri(), 1)?, Some(1));
                assert_eq!(s.add_to_nb_references(tag.uri(), -1)?, Some(0));
                assert_eq!(s.add_to_nb_references(tag.uri(), -1)?, None);
                assert_eq!(s.nb_references(tag.uri())?, Some(0));
                Ok::<_, StorageError>(())
            })
            .unwrap();
    }

    #[test]
    fn missing_identifier_count_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let uri = UserUris::new("roger").generate_identifier_uri();
        let count = store
            .with_session(|s| s.add_to_nb_references(&uri, 1))
            .unwrap();
        assert_eq!(count, None);
    }

    #[test]
    fn link_is_an_upsert() {
        let store = SqliteStore::open_in_memory().unwrap();
        let element = GraphElement::new(UserUris::new("roger").generate_vertex_uri());
        let tag = identifier("roger", "https://example.org/x");
        let relation = Uri::from("https://example.org/relation");

        let tags = store
            .with_session(|s| {
                s.insert_element(ElementKind::Vertex, &element)?;
                s.insert_identifier(&tag)?;
                s.link(element.uri(), RelationKind::IdentifiedTo, tag.uri(), None)?;
                s.link(element.uri(), RelationKind::IdentifiedTo, tag.uri(), Some(&relation))?;
                s.tags_of(element.uri())
            })
            .unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].relation_external_resource_uri, relation);
    }

    #[test]
    fn identifier_lookup_by_external_uri_prefers_oldest() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut older = identifier("ann", "https://example.org/x");
        older.resource.creation_date = from_millis(1_000);
        let newer = identifier("roger", "https://example.org/x");

        let found = store
            .with_session(|s| {
                s.insert_identifier(&newer)?;
                s.insert_identifier(&older)?;
                s.identifier_by_external_uri(&Uri::from("https://example.org/x"))
            })
            .unwrap();
        assert_eq!(found.map(|i| i.resource.uri), Some(older.resource.uri));
    }

    #[test]
    fn friendships_are_symmetric() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (ann, bob) = store
            .with_session(|s| {
                s.set_friendship("bob", "ann", FriendshipStatus::Confirmed)?;
                s.set_friendship("ann", "carl", FriendshipStatus::Requested)?;
                Ok::<_, StorageError>((s.confirmed_friends("ann")?, s.confirmed_friends("bob")?))
            })
            .unwrap();
        assert_eq!(ann, vec!["bob".to_string()]);
        assert_eq!(bob, vec!["ann".to_string()]);
    }

    #[test]
    fn corrupt_share_level_is_a_store_failure() {
        let store = SqliteStore::open_in_memory().unwrap();
        let element = GraphElement::new(UserUris::new("roger").generate_vertex_uri());
        let result = store.with_session(|s| {
            s.insert_element(ElementKind::Vertex, &element)?;
            s.tx.execute(
                "UPDATE resources SET shareLevel = 3 WHERE uri = ?1",
                params![element.uri().as_str()],
            )?;
            s.element(element.uri())
        });
        assert!(result.is_err());
    }
}
