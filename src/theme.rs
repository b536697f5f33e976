//! Thematic clustering of reviews.
//!
//! Three stages fit once per batch (or per bank partition):
//!
//! 1. [`vectorizer::TfIdfVectorizer`] weights the clustering terms of every
//!    review into a sparse TF-IDF matrix over a lexicographic vocabulary.
//! 2. [`reducer::Pca`] projects that matrix onto its leading principal axes.
//! 3. [`clusterer::KMeans`] partitions the reduced rows into thematic groups.

pub mod clusterer;
pub mod reducer;
pub mod vectorizer;

pub use clusterer::{Clustering, KMeans};
pub use reducer::{Pca, PcaModel};
pub use vectorizer::{TfIdfMatrix, TfIdfVectorizer};
