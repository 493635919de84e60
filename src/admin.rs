//! Whole-graph maintenance: reference recounts, sweeps and reindexing

use crate::graph::{ElementKind, GraphElement, GraphError, GraphResult, Identifier, Uri};
use crate::identification;
use crate::storage::{RelationKind, Session, SqliteStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Receiver of element snapshots during a reindex.
///
/// Calls happen after the snapshot session has closed, so an indexer never
/// observes writes in progress and may be slower than the store.
pub trait GraphIndexer {
    fn index_vertex(&self, vertex: &GraphElement) -> GraphResult<()>;
    fn index_relation(&self, edge: &GraphElement) -> GraphResult<()>;
    fn index_schema(&self, schema: &GraphElement) -> GraphResult<()>;
    fn index_property(&self, property: &GraphElement, schema: &GraphElement) -> GraphResult<()>;
    fn index_meta(&self, identifier: &Identifier) -> GraphResult<()>;
}

/// Counts of what a reindex handed to the indexer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexReport {
    pub vertices: usize,
    pub edges: usize,
    pub schemas: usize,
    pub properties: usize,
    pub metas: usize,
}

/// Everything a reindex reads, loaded in one session
#[derive(Default)]
struct Snapshot {
    vertices: Vec<GraphElement>,
    edges: Vec<GraphElement>,
    schemas: Vec<(GraphElement, Vec<GraphElement>)>,
    metas: Vec<Identifier>,
}

pub struct WholeGraphAdmin {
    store: Arc<SqliteStore>,
}

impl WholeGraphAdmin {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Recount the tagging edges of every identifier and store the result.
    ///
    /// Returns how many identifiers had a stale count.
    pub fn refresh_number_of_references_to_all_identifiers(&self) -> GraphResult<usize> {
        self.store.with_session(|s| {
            let mut corrected = 0;
            for uri in s.uris_of_kind(ElementKind::Meta, None)? {
                let live = s.count_relations_to(&uri, RelationKind::IdentifiedTo)?;
                if s.nb_references(&uri)? != Some(live) {
                    debug!(%uri, live, "correcting reference count");
                    s.set_nb_references(&uri, live)?;
                    corrected += 1;
                }
            }
            info!(corrected, "refreshed identifier reference counts");
            Ok(corrected)
        })
    }

    /// Delete identifiers no element is tagged with
    pub fn remove_metas_having_zero_references(&self) -> GraphResult<Vec<Uri>> {
        self.store
            .with_session(|s| identification::sweep_unreferenced(s))
    }

    pub fn reindex_all(&self, indexer: &dyn GraphIndexer) -> GraphResult<ReindexReport> {
        let snapshot = self.store.with_session(|s| snapshot(s, None))?;
        let report = feed(&snapshot, indexer)?;
        info!(?report, "reindexed all users");
        Ok(report)
    }

    pub fn reindex_all_for_user(
        &self,
        user: &str,
        indexer: &dyn GraphIndexer,
    ) -> GraphResult<ReindexReport> {
        let snapshot = self.store.with_session(|s| snapshot(s, Some(user)))?;
        let report = feed(&snapshot, indexer)?;
        info!(user, ?report, "reindexed user");
        Ok(report)
    }
}

fn snapshot(s: &Session<'_>, owner: Option<&str>) -> GraphResult<Snapshot> {
    let load = |uri: &Uri| -> GraphResult<GraphElement> {
        s.element(uri)?
            .ok_or_else(|| GraphError::ElementNotFound(uri.clone()))
    };

    let mut snapshot = Snapshot::default();
    for uri in s.uris_of_kind(ElementKind::Vertex, owner)? {
        snapshot.vertices.push(load(&uri)?);
    }
    for uri in s.uris_of_kind(ElementKind::Edge, owner)? {
        snapshot.edges.push(load(&uri)?);
    }
    for uri in s.uris_of_kind(ElementKind::Schema, owner)? {
        let properties = s
            .targets(&uri, RelationKind::HasProperty)?
            .iter()
            .map(|p| load(p))
            .collect::<GraphResult<Vec<_>>>()?;
        snapshot.schemas.push((load(&uri)?, properties));
    }
    for uri in s.uris_of_kind(ElementKind::Meta, owner)? {
        let identifier = s
            .identifier(&uri)?
            .ok_or_else(|| GraphError::IdentifierNotFound(uri.clone()))?;
        snapshot.metas.push(identifier);
    }
    Ok(snapshot)
}

fn feed(snapshot: &Snapshot, indexer: &dyn GraphIndexer) -> GraphResult<ReindexReport> {
    let mut report = ReindexReport::default();
    for vertex in &snapshot.vertices {
        indexer.index_vertex(vertex)?;
        report.vertices += 1;
    }
    for edge in &snapshot.edges {
        indexer.index_relation(edge)?;
        report.edges += 1;
    }
    for (schema, properties) in &snapshot.schemas {
        indexer.index_schema(schema)?;
        report.schemas += 1;
        for property in properties {
            indexer.index_property(property, schema)?;
            report.properties += 1;
        }
    }
    for meta in &snapshot.metas {
        indexer.index_meta(meta)?;
        report.metas += 1;
    }
    Ok(report)
}
