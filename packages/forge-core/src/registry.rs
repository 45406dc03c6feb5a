use std::sync::Arc;

use serde::Serialize;

use crate::adapters::Adapter;
use crate::artifact::{ArtifactBundle, ArtifactRef, ArtifactType};
use crate::error::Result;

/// Lightweight listing entry: no content payload.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub reference: ArtifactRef,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// A scored search hit, with every matched dimension recorded.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub reference: ArtifactRef,
    pub name: String,
    pub description: String,
    pub score: u32,
    pub matched: Vec<&'static str>,
}

/// Query layer over one adapter (normally a composite).
pub struct Registry {
    adapter: Arc<dyn Adapter>,
}

impl Registry {
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    /// Case-insensitive scored search across all types, or one type.
    ///
    /// Scores accumulate across independent dimensions; zero-score artifacts
    /// are dropped and results sort descending.
    pub async fn search(
        &self,
        query: &str,
        artifact_type: Option<ArtifactType>,
    ) -> Result<Vec<SearchResult>> {
        let needle = query.to_lowercase();
        let types: Vec<ArtifactType> = match artifact_type {
            Some(t) => vec![t],
            None => ArtifactType::ALL.to_vec(),
        };

        let mut results = Vec::new();
        for t in types {
            for meta in self.adapter.list(t).await? {
                let mut score = 0u32;
                let mut matched = Vec::new();

                let id = meta.id.to_lowercase();
                if id == needle {
                    score += 100;
                    matched.push("id");
                } else if id.contains(&needle) {
                    score += 80;
                    matched.push("id");
                }

                let name = meta.name.to_lowercase();
                if name == needle {
                    score += 75;
                    matched.push("name");
                } else if name.contains(&needle) {
                    score += 50;
                    matched.push("name");
                }

                if meta.description.to_lowercase().contains(&needle) {
                    score += 25;
                    matched.push("description");
                }

                if meta.tags.iter().any(|tag| tag.to_lowercase().contains(&needle)) {
                    score += 15;
                    matched.push("tags");
                }

                if score > 0 {
                    results.push(SearchResult {
                        reference: ArtifactRef::new(t, meta.id, meta.version),
                        name: meta.name,
                        description: meta.description,
                        score,
                        matched,
                    });
                }
            }
        }

        results.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(results)
    }

    /// Fetch a single bundle by reference.
    pub async fn get(&self, reference: &ArtifactRef) -> Result<ArtifactBundle> {
        self.adapter.read(reference.artifact_type, &reference.id).await
    }

    /// Flat listing of every artifact, optionally narrowed to one type.
    pub async fn list(&self, artifact_type: Option<ArtifactType>) -> Result<Vec<ArtifactSummary>> {
        let types: Vec<ArtifactType> = match artifact_type {
            Some(t) => vec![t],
            None => ArtifactType::ALL.to_vec(),
        };

        let mut summaries = Vec::new();
        for t in types {
            for meta in self.adapter.list(t).await? {
                summaries.push(ArtifactSummary {
                    reference: ArtifactRef::new(t, meta.id, meta.version),
                    name: meta.name,
                    description: meta.description,
                    tags: meta.tags,
                });
            }
        }
        Ok(summaries)
    }
}
