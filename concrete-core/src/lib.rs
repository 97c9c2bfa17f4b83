//! # concrete-core: Modelo Concrete e conversão Concrete ⇄ BP-JSON
//!
//! Este crate implementa o modelo de dados de anotação linguística Concrete
//! (Communication → Section → Sentence → Tokenization → Token, mais as camadas
//! de entidades e situações) e um conversor bidirecional para o formato de
//! intercâmbio de corpus BP-JSON.
//!
//! ## Arquitetura
//!
//! Os dois formatos endereçam o texto de maneiras diferentes:
//!
//! - **Concrete**: árvore aninhada; tokens numerados localmente em cada
//!   Tokenization; camadas de anotação ligadas por UUID.
//! - **BP-JSON**: lista plana de spans rotulados (`segment-sections`),
//!   tabelas `tok2char`/`char2tok` com índices globais de token.
//!
//! A conversão passa por estes módulos:
//!
//! 1.  **Hierarquia de seções** ([`sections`]): árvore de intervalos a partir
//!     dos spans planos, com preenchimento de lacunas e desempate por tipo.
//! 2.  **Achatamento** ([`flatten`]) e **índice de offsets** ([`offsets`]):
//!     o caminho inverso.
//! 3.  **Remapeamento de anotações** ([`to_bpjson`], [`to_concrete`],
//!     [`slots`]): entidades ⇄ `span-sets`, situações ⇄ `events` e
//!     `granular-templates`.
//! 4.  **Referências internas** ([`linker`]): mapas UUID → objeto.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use concrete_core::bpjson::{CorpusEntry, SegmentSection};
//! use concrete_core::ConversionPipeline;
//!
//! let entry = CorpusEntry {
//!     annotation_sets: None,
//!     char2tok: vec![vec![0], vec![0]],
//!     doc_id: "doc".into(),
//!     entry_id: "doc".into(),
//!     segment_sections: vec![SegmentSection::new(0, 2, "Sentence")],
//!     segment_text: "Oi".into(),
//!     segment_text_tok: vec!["Oi".into()],
//!     segment_type: "story".into(),
//!     tok2char: vec![vec![0, 1]],
//! };
//!
//! let pipeline = ConversionPipeline::new();
//! let communication = pipeline.to_concrete(&entry).unwrap();
//! assert_eq!(communication.sentences().len(), 1);
//!
//! let back = pipeline.to_bpjson(&communication).unwrap();
//! assert_eq!(back, entry);
//! ```

pub mod bpjson;
pub mod codec;
pub mod config;
pub mod error;
pub mod flatten;
pub mod ids;
pub mod linker;
pub mod model;
pub mod navigation;
pub mod offsets;
pub mod pipeline;
pub mod sections;
pub mod slots;
pub mod to_bpjson;
pub mod to_concrete;
pub mod token_tagging;

pub use bpjson::{Corpus, CorpusEntry};
pub use codec::{JsonCodec, RecordCodec};
pub use config::ConversionOptions;
pub use error::{ConversionError, Result};
pub use ids::{ConcreteUuid, RandomUuidGenerator, SequentialUuidGenerator, UuidGenerator};
pub use linker::{add_internal_references, InternalReferences};
pub use model::Communication;
pub use pipeline::ConversionPipeline;
pub use to_bpjson::convert_concrete_to_bpjson;
pub use to_concrete::convert_bpjson_to_concrete;
