//! SQLite implementation of [`ArtifactSink`].
//!
//! [`SqliteSink`] persists every delivery in one transaction: the sampler
//! row (with the packed call record it was generated from) and, when
//! present, its post-processor row. Re-delivering a call with the same
//! artifact id replaces the earlier rows.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::record::CallRecord;
use crate::traits::ArtifactSink;
use crate::types::{
    ArtifactId, ArtifactSummary, PostProcessorArtifact, SamplerArtifact, StoredArtifact,
};

/// SQLite-backed implementation of [`ArtifactSink`].
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteSink { conn })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteSink { conn })
    }

    /// Lists all stored artifacts ordered by call index.
    pub fn list_artifacts(&self) -> Result<Vec<ArtifactSummary>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name, s.call_index, s.target, s.method_name,
                    EXISTS(SELECT 1 FROM post_processors p WHERE p.sampler_id = s.id)
             FROM samplers s ORDER BY s.call_index, s.rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ArtifactSummary {
                id: ArtifactId(row.get(0)?),
                name: row.get(1)?,
                call_index: row.get(2)?,
                target: row.get(3)?,
                method_name: row.get(4)?,
                has_post_processor: row.get(5)?,
            })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Loads one artifact with its post-processor.
    pub fn get_artifact(&self, id: &ArtifactId) -> Result<StoredArtifact, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT name, call_index, target, method_name, mangled_signature, arguments_script
                 FROM samplers WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;
        let (name, call_index, target, method_name, mangled_signature, arguments_script) =
            row.ok_or_else(|| StorageError::ArtifactNotFound(id.0.clone()))?;

        let post_processor = self
            .conn
            .query_row(
                "SELECT id, name, script, reset_interpreter FROM post_processors
                 WHERE sampler_id = ?1",
                params![id.0],
                |row| {
                    Ok(PostProcessorArtifact {
                        id: ArtifactId(row.get(0)?),
                        name: row.get(1)?,
                        script: row.get(2)?,
                        reset_interpreter: row.get(3)?,
                        runs_after: id.clone(),
                    })
                },
            )
            .optional()?;

        Ok(StoredArtifact {
            call_index,
            mangled_signature,
            sampler: SamplerArtifact {
                id: id.clone(),
                name,
                target,
                method_name,
                arguments_script,
            },
            post_processor,
        })
    }

    /// Returns the packed call record stored with an artifact, if the
    /// record was completed when it was delivered.
    pub fn load_record_bytes(&self, id: &ArtifactId) -> Result<Option<Vec<u8>>, StorageError> {
        let bytes: Option<Option<Vec<u8>>> = self
            .conn
            .query_row(
                "SELECT record FROM samplers WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;
        bytes.ok_or_else(|| StorageError::ArtifactNotFound(id.0.clone()))
    }

    /// Deletes an artifact and its post-processor.
    pub fn delete_artifact(&mut self, id: &ArtifactId) -> Result<(), StorageError> {
        let deleted = self
            .conn
            .execute("DELETE FROM samplers WHERE id = ?1", params![id.0])?;
        if deleted == 0 {
            return Err(StorageError::ArtifactNotFound(id.0.clone()));
        }
        Ok(())
    }
}

impl ArtifactSink for SqliteSink {
    fn deliver(
        &mut self,
        primary: &SamplerArtifact,
        secondary: Option<&PostProcessorArtifact>,
        record: &CallRecord,
    ) -> Result<(), StorageError> {
        let packed = if record.is_completed() {
            Some(record.pack()?)
        } else {
            None
        };

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM samplers WHERE id = ?1",
            params![primary.id.0],
        )?;
        tx.execute(
            "INSERT INTO samplers
                (id, name, call_index, target, method_name, mangled_signature, arguments_script, record)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                primary.id.0,
                primary.name,
                record.index(),
                primary.target,
                primary.method_name,
                record.mangled_signature(),
                primary.arguments_script,
                packed,
            ],
        )?;
        if let Some(post) = secondary {
            tx.execute(
                "INSERT INTO post_processors (id, sampler_id, name, script, reset_interpreter)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    post.id.0,
                    post.runs_after.0,
                    post.name,
                    post.script,
                    post.reset_interpreter,
                ],
            )?;
        }
        tx.commit()?;

        tracing::debug!(
            artifact = %primary.id,
            method = %primary.method_name,
            post_processor = secondary.is_some(),
            "stored recorded call"
        );
        Ok(())
    }
}
