//! ModelStore assembly: validation, index maps, CSR matrices and the derived
//! lookup indices.
//!
//! Both construction paths go through [`ModelStoreBuilder`]:
//! - [`ModelStore::load`] parses the artifact directory and feeds the builder
//! - tests and embedders call the builder directly

use crate::error::{LoadError, Result};
use crate::matrix::{CsrMatrix, IdIndex};
use crate::parser;
use crate::store::ModelStore;
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Collects raw artifacts, then validates and indexes them in [`build`](Self::build)
#[derive(Debug, Default)]
pub struct ModelStoreBuilder {
    raw_counts: Vec<Interaction>,
    quality_weighted: Option<Vec<Interaction>>,
    articles: Vec<ArticleMeta>,
    popularity: Vec<PopularityEntry>,
    embeddings: Vec<(ArticleId, Vec<f32>)>,
    histories: Vec<(UserId, Vec<ArticleId>)>,
}

impl ModelStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one raw-count interaction
    pub fn interaction(mut self, user_id: UserId, article_id: ArticleId, count: f32) -> Self {
        self.raw_counts.push(Interaction {
            user_id,
            article_id,
            weight: count,
        });
        self
    }

    /// Add one quality-weighted interaction (enables the weighted matrix)
    pub fn weighted_interaction(mut self, user_id: UserId, article_id: ArticleId, weight: f32) -> Self {
        self.quality_weighted
            .get_or_insert_with(Vec::new)
            .push(Interaction {
                user_id,
                article_id,
                weight,
            });
        self
    }

    pub fn article(mut self, meta: ArticleMeta) -> Self {
        self.articles.push(meta);
        self
    }

    pub fn popularity(mut self, article_id: ArticleId, base_score: f32) -> Self {
        self.popularity.push(PopularityEntry {
            article_id,
            base_score,
        });
        self
    }

    pub fn embedding(mut self, article_id: ArticleId, vector: Vec<f32>) -> Self {
        self.embeddings.push((article_id, vector));
        self
    }

    pub fn history(mut self, user_id: UserId, articles: Vec<ArticleId>) -> Self {
        self.histories.push((user_id, articles));
        self
    }

    /// Validate everything and build the immutable store
    pub fn build(self) -> Result<ModelStore> {
        validate_interactions(&self.raw_counts)?;
        if let Some(weighted) = &self.quality_weighted {
            validate_interactions(weighted)?;
        }
        validate_popularity(&self.popularity)?;
        let embedding_dim = validate_embeddings(&self.embeddings)?;

        // One index space shared by both matrix variants
        let all_interactions = self
            .raw_counts
            .iter()
            .chain(self.quality_weighted.iter().flatten());
        let user_index = IdIndex::from_ids(all_interactions.clone().map(|i| i.user_id));
        let article_index = IdIndex::from_ids(all_interactions.map(|i| i.article_id));

        let raw_counts = build_matrix(&self.raw_counts, &user_index, &article_index);
        let quality_weighted = self
            .quality_weighted
            .as_deref()
            .map(|weighted| build_matrix(weighted, &user_index, &article_index));

        let mut store = ModelStore {
            user_index,
            article_index,
            raw_counts,
            quality_weighted,
            embeddings: self.embeddings.into_iter().collect(),
            embedding_dim,
            popularity: dedup_popularity(self.popularity),
            articles: self
                .articles
                .into_iter()
                .map(|meta| (meta.article_id, meta))
                .collect(),
            profiles: HashMap::new(),
            article_timestamps: HashMap::new(),
            article_categories: HashMap::new(),
        };

        store.build_lookup_indices();
        store.build_profiles(self.histories);

        Ok(store)
    }
}

impl ModelStore {
    pub fn builder() -> ModelStoreBuilder {
        ModelStoreBuilder::new()
    }

    /// Load every artifact from `model_dir`.
    ///
    /// All artifacts are required except `interactions_weighted.dat`; without
    /// it the raw-count matrix backs the scorers and a warning is logged.
    pub fn load(model_dir: &Path) -> Result<Self> {
        info!("Loading model artifacts from {:?}", model_dir);
        let start = Instant::now();

        let required = |name: &str| {
            let path = model_dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(LoadError::FileNotFound {
                    path: path.display().to_string(),
                })
            }
        };

        let interactions_path = required(parser::INTERACTIONS_FILE)?;
        let articles_path = required(parser::ARTICLES_FILE)?;
        let popularity_path = required(parser::POPULARITY_FILE)?;
        let embeddings_path = required(parser::EMBEDDINGS_FILE)?;
        let histories_path = required(parser::HISTORIES_FILE)?;
        let weighted_path = model_dir.join(parser::WEIGHTED_INTERACTIONS_FILE);

        // Parse the artifacts in parallel
        let (((raw, weighted), (articles, popularity)), (embeddings, histories)) = rayon::join(
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || parser::parse_interactions(&interactions_path),
                            || {
                                if weighted_path.is_file() {
                                    parser::parse_interactions(&weighted_path).map(Some)
                                } else {
                                    Ok(None)
                                }
                            },
                        )
                    },
                    || {
                        rayon::join(
                            || parser::parse_articles(&articles_path),
                            || parser::parse_popularity(&popularity_path),
                        )
                    },
                )
            },
            || {
                rayon::join(
                    || parser::parse_embeddings(&embeddings_path),
                    || parser::parse_histories(&histories_path),
                )
            },
        );

        let weighted = weighted?;
        if weighted.is_none() {
            warn!(
                "{} not found, falling back to the raw-count interaction matrix",
                parser::WEIGHTED_INTERACTIONS_FILE
            );
        }

        let articles = articles?;
        if articles.is_empty() {
            return Err(LoadError::Validation(format!(
                "{} contains no records",
                parser::ARTICLES_FILE
            )));
        }

        let builder = ModelStoreBuilder {
            raw_counts: raw?,
            quality_weighted: weighted,
            articles,
            popularity: popularity?,
            embeddings: embeddings?,
            histories: histories?,
        };
        let store = builder.build()?;

        let (users, articles, interactions) = store.counts();
        info!(
            users,
            articles,
            interactions,
            embedding_dim = store.embedding_dim(),
            matrix = ?store.matrix_kind(),
            elapsed = ?start.elapsed(),
            "Model store loaded"
        );
        Ok(store)
    }

    /// Build the article -> timestamp and article -> category maps once so
    /// scoring never scans the metadata table
    fn build_lookup_indices(&mut self) {
        self.article_timestamps = self
            .articles
            .values()
            .map(|meta| (meta.article_id, meta.created_at_ts))
            .collect();
        self.article_categories = self
            .articles
            .values()
            .map(|meta| (meta.article_id, meta.category_id))
            .collect();
    }

    /// Attach per-item weights from the active matrix to every history
    fn build_profiles(&mut self, histories: Vec<(UserId, Vec<ArticleId>)>) {
        let mut profiles = HashMap::with_capacity(histories.len());

        for (user_id, history) in histories {
            let mut weights = HashMap::new();
            if let Some(row) = self.user_index.index_of(user_id) {
                let matrix = self.interactions();
                for &article_id in &history {
                    let weight = self
                        .article_index
                        .index_of(article_id)
                        .and_then(|col| matrix.get(row, col));
                    if let Some(weight) = weight {
                        weights.insert(article_id, weight);
                    }
                }
            }

            if profiles.contains_key(&user_id) {
                debug!(user_id, "Duplicate history line, keeping the last one");
            }
            profiles.insert(user_id, UserProfile::new(user_id, history, weights));
        }

        self.profiles = profiles;
    }
}

fn build_matrix(interactions: &[Interaction], users: &IdIndex, articles: &IdIndex) -> CsrMatrix {
    // Every id was used to build the indices, so lookups always resolve
    let triplets = interactions
        .iter()
        .filter_map(|i| Some((users.index_of(i.user_id)?, articles.index_of(i.article_id)?, i.weight)))
        .collect();
    CsrMatrix::from_triplets(users.len(), articles.len(), triplets)
}

/// Keep one entry per article; a later line overrides an earlier one
fn dedup_popularity(entries: Vec<PopularityEntry>) -> Vec<PopularityEntry> {
    let mut positions: HashMap<ArticleId, usize> = HashMap::with_capacity(entries.len());
    let mut deduped: Vec<PopularityEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match positions.get(&entry.article_id) {
            Some(&position) => deduped[position] = entry,
            None => {
                positions.insert(entry.article_id, deduped.len());
                deduped.push(entry);
            }
        }
    }
    deduped
}

fn validate_interactions(interactions: &[Interaction]) -> Result<()> {
    for interaction in interactions {
        if !interaction.weight.is_finite() || interaction.weight <= 0.0 {
            return Err(LoadError::InvalidValue {
                field: "interaction weight".to_string(),
                value: format!(
                    "{} (user {}, article {})",
                    interaction.weight, interaction.user_id, interaction.article_id
                ),
            });
        }
    }
    Ok(())
}

fn validate_popularity(entries: &[PopularityEntry]) -> Result<()> {
    for entry in entries {
        if !(0.0..=1.0).contains(&entry.base_score) {
            return Err(LoadError::InvalidValue {
                field: "popularity base_score".to_string(),
                value: format!("{} (article {})", entry.base_score, entry.article_id),
            });
        }
    }
    Ok(())
}

/// Returns the shared dimension (0 when there are no embeddings)
fn validate_embeddings(embeddings: &[(ArticleId, Vec<f32>)]) -> Result<usize> {
    let Some((_, first)) = embeddings.first() else {
        return Ok(0);
    };
    let expected = first.len();

    for (article_id, vector) in embeddings {
        if vector.len() != expected {
            return Err(LoadError::DimensionMismatch {
                article_id: *article_id,
                expected,
                found: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(LoadError::InvalidValue {
                field: "embedding".to_string(),
                value: format!("non-finite component (article {})", article_id),
            });
        }
    }
    Ok(expected)
}
