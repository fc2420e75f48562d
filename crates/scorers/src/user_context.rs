//! Builds the per-request taste profile used by content scoring.
//!
//! Everything the content scorer needs about the user is gathered once up
//! front: the weighted-average embedding of the history and the category
//! frequency table.

use model_store::{CategoryId, ModelStore, UserId, UserProfile};
use std::collections::HashMap;

/// A user's aggregate content preference
#[derive(Debug, Clone)]
pub struct TasteProfile<'a> {
    pub profile: &'a UserProfile,
    /// Weighted average of the history embeddings
    pub taste: Vec<f32>,
    /// category -> count / history length
    pub category_frequencies: HashMap<CategoryId, f32>,
}

/// Build the taste profile for `user_id`.
///
/// Returns `None` when the user has no history, or when none of the history
/// items has an embedding (items without one are skipped, never zero-filled).
pub fn build_taste_profile(store: &ModelStore, user_id: UserId) -> Option<TasteProfile<'_>> {
    let profile = store.profile(user_id)?;
    if profile.is_empty() {
        return None;
    }

    let taste = compute_taste_vector(store, profile)?;
    let category_frequencies = profile.category_frequencies(|id| store.article_category(id));

    Some(TasteProfile {
        profile,
        taste,
        category_frequencies,
    })
}

/// Weighted average of history embeddings (weight = interaction strength)
fn compute_taste_vector(store: &ModelStore, profile: &UserProfile) -> Option<Vec<f32>> {
    let mut sum = vec![0.0f32; store.embedding_dim()];
    let mut total_weight = 0.0f32;

    for &article_id in &profile.history {
        let Some(embedding) = store.embedding(article_id) else {
            continue;
        };
        let weight = profile.weight_of(article_id);
        for (acc, value) in sum.iter_mut().zip(embedding) {
            *acc += weight * value;
        }
        total_weight += weight;
    }

    if total_weight <= 0.0 {
        return None;
    }
    for value in &mut sum {
        *value /= total_weight;
    }
    Some(sum)
}
