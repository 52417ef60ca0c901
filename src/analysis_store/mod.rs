mod blocking;
mod models;
mod schema;
mod store;
mod trait_def;

pub use blocking::with_store;
pub use models::{
    AffectPrediction, AffectRow, AnalysisRecord, DescriptorSet, DescriptorValue, Embedding,
};
pub use store::SqliteAnalysisStore;
pub use trait_def::AnalysisStore;
