//! # Achatamento de Seções
//!
//! Direção inversa de [`crate::sections`]: transforma a árvore
//! `Section → Sentence` numa lista plana de `segment-sections`.
//!
//! São emitidos, nesta ordem:
//! 1. um registro `Sentence` por sentença, exceto as de seções `Ignore`;
//! 2. um registro por seção cujo tipo canônico pertence ao vocabulário do
//!    BP-JSON, com esse tipo canônico. Seções sintéticas `Unknown` e tipos
//!    fora do vocabulário não aparecem.
//!
//! Assim o tipo de cada seção sobrevive na forma plana e `Build(Flatten(d))`
//! reproduz `d` quando `d` veio de um `Build` anterior.

use crate::bpjson::{SegmentSection, BPJSON_SECTION_KINDS};
use crate::error::Result;
use crate::model::Communication;
use crate::offsets::OffsetIndex;
use crate::sections::{denormalize_section_kind, is_ignore_kind};

/// Estrutura plana de um documento.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedDocument {
    pub segment_sections: Vec<SegmentSection>,
    pub offsets: OffsetIndex,
    pub segment_text_tok: Vec<String>,
}

pub fn flatten_sections(communication: &Communication) -> Vec<SegmentSection> {
    let sentences = communication
        .section_list
        .iter()
        .filter(|section| !is_ignore_kind(&section.kind))
        .flat_map(|section| section.sentence_list.iter())
        .map(|sentence| {
            SegmentSection::new(
                sentence.text_span.start,
                sentence.text_span.ending,
                "Sentence",
            )
        });

    let sections = communication.section_list.iter().filter_map(|section| {
        let kind = denormalize_section_kind(&section.kind);
        BPJSON_SECTION_KINDS
            .contains(&kind.as_str())
            .then(|| SegmentSection::new(section.text_span.start, section.text_span.ending, kind))
    });

    sentences.chain(sections).collect()
}

/// Achata seções e recalcula as tabelas de offset.
pub fn flatten(communication: &Communication) -> Result<FlattenedDocument> {
    let offsets = OffsetIndex::build(communication)?;
    let chars: Vec<char> = communication.text.chars().collect();
    let segment_text_tok = offsets.segment_text_tok(&chars)?;
    Ok(FlattenedDocument {
        segment_sections: flatten_sections(communication),
        offsets,
        segment_text_tok,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{SequentialUuidGenerator, UuidGenerator};
    use crate::sections::build_sections;

    fn communication(spans: &[(usize, usize, &str)]) -> Communication {
        let gen = SequentialUuidGenerator::new();
        let segment_sections: Vec<SegmentSection> = spans
            .iter()
            .map(|(s, e, k)| SegmentSection::new(*s, *e, *k))
            .collect();
        let tok2char = vec![vec![0, 1, 2, 3, 4], vec![5], vec![7, 8, 9, 10, 11], vec![12]];
        let hierarchy = build_sections(&segment_sections, &tok2char, "Hello, world!", &gen).unwrap();
        let mut comm = Communication::new("doc", gen.generate(), "story", "Hello, world!");
        comm.section_list = hierarchy.sections;
        comm
    }

    fn triples(sections: &[SegmentSection]) -> Vec<(usize, usize, &str)> {
        sections
            .iter()
            .map(|s| (s.start, s.end, s.structural_element.as_str()))
            .collect()
    }

    #[test]
    fn test_sentences_then_sections() {
        let spans = [
            (0, 5, "Sentence"),
            (5, 6, "Sentence"),
            (7, 13, "Sentence"),
            (0, 5, "Headline"),
            (5, 6, "Headline"),
            (7, 13, "Dateline"),
        ];
        let comm = communication(&spans);
        assert_eq!(triples(&flatten_sections(&comm)), spans.to_vec());
    }

    #[test]
    fn test_unknown_sections_not_emitted() {
        let comm = communication(&[
            (0, 5, "Sentence"),
            (5, 6, "Sentence"),
            (7, 13, "Sentence"),
            (0, 5, "Headline"),
            (5, 6, "Headline"),
        ]);
        assert_eq!(
            triples(&flatten_sections(&comm)),
            vec![
                (0, 5, "Sentence"),
                (5, 6, "Sentence"),
                (7, 13, "Sentence"),
                (0, 5, "Headline"),
                (5, 6, "Headline"),
            ]
        );
    }

    #[test]
    fn test_ignore_sentences_skipped() {
        let comm = communication(&[(0, 5, "Ignore"), (5, 6, "Sentence"), (7, 13, "Sentence")]);
        assert_eq!(
            triples(&flatten_sections(&comm)),
            vec![(5, 6, "Sentence"), (7, 13, "Sentence"), (0, 5, "Ignore")]
        );
    }

    #[test]
    fn test_kinds_are_canonicalized() {
        let comm = communication(&[
            (0, 5, "SentencE"),
            (5, 6, "STORY-LEAD"),
            (7, 13, "dATELINE"),
        ]);
        assert_eq!(
            triples(&flatten_sections(&comm)),
            vec![
                (0, 5, "Sentence"),
                (5, 6, "Sentence"),
                (7, 13, "Sentence"),
                (5, 6, "Story-Lead"),
                (7, 13, "Dateline"),
            ]
        );
    }

    #[test]
    fn test_invalid_kinds_filtered_but_sentences_kept() {
        let comm = communication(&[(0, 6, "Section_Body"), (7, 13, "Sentence")]);
        assert_eq!(
            triples(&flatten_sections(&comm)),
            vec![(0, 6, "Sentence"), (7, 13, "Sentence")]
        );
    }

    #[test]
    fn test_flatten_recomputes_offsets() {
        let comm = communication(&[(0, 8, "Sentence"), (12, 13, "Sentence")]);
        let flat = flatten(&comm).unwrap();
        assert_eq!(flat.offsets.tok2char, vec![vec![0, 1, 2, 3, 4], vec![5], vec![12]]);
        assert_eq!(flat.segment_text_tok, vec!["Hello", ",", "!"]);
        assert!(flat.offsets.char2tok[7..12].iter().all(|c| c.is_empty()));
        assert_eq!(flat.offsets.char2tok[12], vec![2]);
    }
}
