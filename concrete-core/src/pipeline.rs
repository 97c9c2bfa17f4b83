//! # Pipeline de Conversão
//!
//! Junta as opções de conversão e o gerador de UUIDs num único objeto
//! compartilhável, e adiciona a conversão em lote de corpora inteiros.
//!
//! Cada documento é convertido de forma síncrona e independente. Em lote, as
//! entradas são distribuídas entre threads com `rayon`; a primeira falha
//! interrompe o lote e é devolvida ao chamador (sem saída parcial).

use std::collections::btree_map::Entry;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use crate::bpjson::{Corpus, CorpusEntry};
use crate::config::ConversionOptions;
use crate::error::{ConversionError, Result};
use crate::ids::{RandomUuidGenerator, UuidGenerator};
use crate::model::Communication;
use crate::to_bpjson::convert_concrete_to_bpjson;
use crate::to_concrete::convert_bpjson_to_concrete;

/// Conversor configurado. Barato de clonar; seguro entre threads.
#[derive(Clone)]
pub struct ConversionPipeline {
    pub options: ConversionOptions,
    pub uuid_generator: Arc<dyn UuidGenerator>,
}

impl Default for ConversionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ConversionPipeline {
    /// Opções padrão e UUIDs aleatórios (v4).
    pub fn new() -> Self {
        Self {
            options: ConversionOptions::default(),
            uuid_generator: Arc::new(RandomUuidGenerator),
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    /// Troca o gerador de UUIDs (ex.: sequencial, para saídas reprodutíveis).
    pub fn with_uuid_generator(mut self, uuid_generator: Arc<dyn UuidGenerator>) -> Self {
        self.uuid_generator = uuid_generator;
        self
    }

    pub fn to_bpjson(&self, communication: &Communication) -> Result<CorpusEntry> {
        convert_concrete_to_bpjson(communication, &self.options)
    }

    pub fn to_concrete(&self, entry: &CorpusEntry) -> Result<Communication> {
        convert_bpjson_to_concrete(entry, &self.options, self.uuid_generator.as_ref())
    }

    /// Converte todas as entradas do corpus, na ordem de `entry-id`.
    pub fn corpus_to_concrete(&self, corpus: &Corpus) -> Result<Vec<Communication>> {
        let entries: Vec<&CorpusEntry> = corpus.entries.values().collect();
        let communications = entries
            .par_iter()
            .map(|entry| self.to_concrete(entry))
            .collect::<Result<Vec<_>>>()?;
        info!(
            corpus_id = %corpus.corpus_id,
            documents = communications.len(),
            "corpus convertido para Concrete"
        );
        Ok(communications)
    }

    /// Monta um corpus com uma entrada por Communication, indexada por `entry-id`.
    pub fn communications_to_corpus(
        &self,
        corpus_id: &str,
        communications: &[Communication],
    ) -> Result<Corpus> {
        let entries = communications
            .par_iter()
            .map(|communication| self.to_bpjson(communication))
            .collect::<Result<Vec<_>>>()?;

        let mut corpus = Corpus::new(corpus_id);
        for entry in entries {
            match corpus.entries.entry(entry.entry_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(slot) => {
                    return Err(ConversionError::DuplicateEntry {
                        id: slot.key().clone(),
                    })
                }
            }
        }
        info!(
            corpus_id,
            entries = corpus.entries.len(),
            "corpus BP-JSON montado"
        );
        Ok(corpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpjson::{SegmentSection, CORPUS_FORMAT_VERSION};
    use crate::ids::SequentialUuidGenerator;

    fn entry(id: &str, text: &str) -> CorpusEntry {
        let len = text.chars().count();
        CorpusEntry {
            annotation_sets: None,
            char2tok: (0..len).map(|c| vec![c]).collect(),
            doc_id: id.into(),
            entry_id: id.into(),
            segment_sections: vec![SegmentSection::new(0, len, "Sentence")],
            segment_text: text.into(),
            segment_text_tok: text.chars().map(String::from).collect(),
            segment_type: "story".into(),
            tok2char: (0..len).map(|c| vec![c]).collect(),
        }
    }

    fn pipeline() -> ConversionPipeline {
        ConversionPipeline::new().with_uuid_generator(Arc::new(SequentialUuidGenerator::new()))
    }

    #[test]
    fn test_corpus_round_trip() {
        let mut corpus = Corpus::new("corpus-1");
        for (id, text) in [("b", "xyz"), ("a", "ok"), ("c", "fim")] {
            corpus.entries.insert(id.to_string(), entry(id, text));
        }

        let pipeline = pipeline();
        let communications = pipeline.corpus_to_concrete(&corpus).unwrap();
        let ids: Vec<&str> = communications.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let back = pipeline
            .communications_to_corpus("corpus-1", &communications)
            .unwrap();
        assert_eq!(back.format_version, CORPUS_FORMAT_VERSION);
        assert_eq!(back, corpus);
    }

    #[test]
    fn test_uuids_unique_across_batch() {
        let mut corpus = Corpus::new("c");
        for id in ["a", "b", "c", "d"] {
            corpus.entries.insert(id.to_string(), entry(id, "abc"));
        }
        let communications = pipeline().corpus_to_concrete(&corpus).unwrap();
        let mut uuids: Vec<String> = communications
            .iter()
            .map(|c| c.uuid.to_string())
            .collect();
        uuids.sort();
        uuids.dedup();
        assert_eq!(uuids.len(), 4);
    }

    #[test]
    fn test_batch_fails_on_first_error() {
        let mut corpus = Corpus::new("c");
        corpus.entries.insert("ok".into(), entry("ok", "abc"));
        let mut broken = entry("broken", "abc");
        broken.segment_sections = vec![
            SegmentSection::new(0, 2, "Headline"),
            SegmentSection::new(1, 3, "Dateline"),
        ];
        corpus.entries.insert("broken".into(), broken);

        let err = pipeline().corpus_to_concrete(&corpus).unwrap_err();
        assert!(matches!(err, ConversionError::NonHierarchicalOverlap { .. }));
    }

    #[test]
    fn test_duplicate_entry_id_is_error() {
        let pipeline = pipeline();
        let first = pipeline.to_concrete(&entry("same", "abc")).unwrap();
        let second = pipeline.to_concrete(&entry("same", "xyz")).unwrap();
        let err = pipeline
            .communications_to_corpus("c", &[first, second])
            .unwrap_err();
        assert_eq!(err, ConversionError::DuplicateEntry { id: "same".into() });
    }
}
