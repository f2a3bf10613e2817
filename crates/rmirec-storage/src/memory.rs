//! In-memory implementation of [`ArtifactSink`].
//!
//! [`InMemorySink`] is a first-class backend for tests and ephemeral
//! recording sessions. Deliveries are kept in arrival order.

use crate::error::StorageError;
use crate::record::CallRecord;
use crate::traits::ArtifactSink;
use crate::types::{ArtifactId, PostProcessorArtifact, SamplerArtifact};

/// Everything delivered for one recorded call.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub primary: SamplerArtifact,
    pub secondary: Option<PostProcessorArtifact>,
    pub record: CallRecord,
}

/// Sink that keeps all deliveries in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    deliveries: Vec<Delivery>,
}

impl InMemorySink {
    pub fn new() -> Self {
        InMemorySink::default()
    }

    /// All deliveries, in arrival order.
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Finds the delivery whose primary artifact has id `id`.
    pub fn find(&self, id: &ArtifactId) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| &d.primary.id == id)
    }

    /// The most recent delivery.
    pub fn last(&self) -> Option<&Delivery> {
        self.deliveries.last()
    }
}

impl ArtifactSink for InMemorySink {
    fn deliver(
        &mut self,
        primary: &SamplerArtifact,
        secondary: Option<&PostProcessorArtifact>,
        record: &CallRecord,
    ) -> Result<(), StorageError> {
        self.deliveries.push(Delivery {
            primary: primary.clone(),
            secondary: secondary.cloned(),
            record: record.clone(),
        });
        Ok(())
    }
}
