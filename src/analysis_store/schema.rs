//! SQLite schema definitions for the analysis database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

/// One row per analyzed track.
///
/// `song_id` is indexed but deliberately not unique: uniqueness is enforced by
/// check-before-insert, readers always pick the earliest row.
const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("row_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("song_id", &SqlType::Text, non_null = true),
        sqlite_column!("analysis", &SqlType::Text, non_null = true), // JSON descriptor map
        sqlite_column!("embeddings", &SqlType::Text, non_null = true), // JSON matrix
        sqlite_column!("valence", &SqlType::Real),
        sqlite_column!("arousal", &SqlType::Real),
        sqlite_column!("va", &SqlType::Text, non_null = true), // JSON AffectPrediction
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_songs_song_id", "song_id")],
};

pub const ANALYSIS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[SONGS_TABLE],
    migration: None,
}];
