//! # Model Store Crate
//!
//! Loads and indexes the offline artifacts the recommendation engine scores
//! against. The store is immutable once built; hosts share it behind an `Arc`
//! and swap the whole `Arc` on reload.
//!
//! ## Main Components
//!
//! - **types**: Domain types (ArticleMeta, PopularityEntry, UserProfile, ids)
//! - **matrix**: Id index maps and the CSR interaction matrix
//! - **parser**: Parse the `::`-separated `.dat` artifacts
//! - **index**: ModelStoreBuilder, validation and `ModelStore::load`
//! - **store**: The ModelStore itself and its read accessors
//! - **error**: LoadError
//!
//! ## Example Usage
//!
//! ```ignore
//! use model_store::ModelStore;
//! use std::path::Path;
//!
//! let store = ModelStore::load(Path::new("data/news"))?;
//!
//! let profile = store.profile(42).unwrap();
//! let meta = store.article(profile.history[0]).unwrap();
//! println!("User 42 read {} articles, first in category {}", profile.history.len(), meta.category_id);
//! ```

pub mod error;
pub mod index;
pub mod matrix;
pub mod parser;
pub mod store;
pub mod types;

pub use error::{LoadError, Result};
pub use index::ModelStoreBuilder;
pub use matrix::{CsrMatrix, IdIndex, SparseRow};
pub use store::ModelStore;
pub use types::{
    // Type aliases
    ArticleId,
    CategoryId,
    PublisherId,
    TimestampMs,
    UserId,
    // Core types
    ArticleMeta,
    Interaction,
    MatrixKind,
    PopularityEntry,
    UserProfile,
    MS_PER_DAY,
    age_in_days,
};
