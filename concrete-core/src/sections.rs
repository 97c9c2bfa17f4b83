//! # Construção da Hierarquia de Seções
//!
//! Reconstrói a árvore Concrete `Section → Sentence → Tokenization → Token` a
//! partir da lista **plana** e não ordenada de `segment-sections` do BP-JSON.
//!
//! ## Algoritmo
//!
//! 1. **Árvore de intervalos**: cada span é inserido a partir de uma raiz
//!    sintética `[0, len)` do tipo `Unknown`. Desce-se para o filho que contém
//!    o span; se o span for idêntico ao de um nó existente com outro tipo, o
//!    novo nó vira filho único dele, e a ordem de prioridade de tipos decide
//!    qual dos dois fica em cima. Spans que se cruzam sem hierarquia são erro.
//! 2. **Identificação de sentenças**: um nó `sentence` sem filhos é uma
//!    sentença; um nó `sentence` com filhos vira um invólucro interno; um nó
//!    de outro tipo sem filhos recebe uma sentença sintética com o seu span.
//! 3. **Achatamento**: nós que contêm sentenças diretamente viram `Section`s;
//!    num nó que mistura sentenças e subseções, cada sequência contígua de
//!    sentenças é embrulhada numa seção sintética `Unknown`.
//! 4. **População de tokens**: cada entrada de `tok2char` vira um `Token` da
//!    sentença que contém o seu primeiro e o seu último caractere. Tokens que
//!    atravessam fronteiras de sentença são **descartados** com um aviso.
//!
//! Comparações de tipo ignoram maiúsculas; a grafia de entrada é preservada
//! no lado Concrete.

use tracing::{debug, warn};

use crate::bpjson::SegmentSection;
use crate::error::{ConversionError, Result};
use crate::ids::{ConcreteUuid, UuidGenerator};
use crate::model::{Section, Sentence, TextSpan, Token, Tokenization};

pub const UNKNOWN_KIND: &str = "Unknown";
const SENTENCE_KIND: &str = "sentence";
const IGNORE_KIND: &str = "ignore";
const SENTENCE_WRAPPER_KIND: &str = "temp_sentence_wrapper";

/// Ordem dos tipos quando dois spans coincidem (menor = mais perto da raiz).
/// `*` representa qualquer tipo fora da lista.
const EQUIVALENT_KIND_ORDER: [&str; 7] = [
    "section",
    "section_header",
    "story-lead",
    "*",
    IGNORE_KIND,
    SENTENCE_WRAPPER_KIND,
    SENTENCE_KIND,
];

pub fn normalize_section_kind(kind: &str) -> String {
    kind.to_lowercase()
}

/// Forma canônica do BP-JSON: `story-lead` → `Story-Lead`, `SECTION_HEADER` → `Section_Header`.
pub fn denormalize_section_kind(kind: &str) -> String {
    normalize_section_kind(kind)
        .split('-')
        .map(|part| {
            part.split('_')
                .map(start_case)
                .collect::<Vec<_>>()
                .join("_")
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn start_case(word: &str) -> String {
    word.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn is_ignore_kind(kind: &str) -> bool {
    normalize_section_kind(kind) == IGNORE_KIND
}

fn equivalent_kind_order(kind: &str) -> usize {
    let normalized = normalize_section_kind(kind);
    EQUIVALENT_KIND_ORDER
        .iter()
        .position(|k| *k == normalized)
        .or_else(|| EQUIVALENT_KIND_ORDER.iter().position(|k| *k == "*"))
        .unwrap_or(3)
}

/// Nó da árvore de intervalos. Filhos ficam ordenados e sem sobreposição.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionNode {
    pub start: usize,
    pub ending: usize,
    pub kind: String,
    pub children: Vec<SectionNode>,
    pub is_sentence: bool,
}

impl SectionNode {
    pub fn new(start: usize, ending: usize, kind: impl Into<String>) -> Self {
        Self {
            start,
            ending,
            kind: kind.into(),
            children: Vec::new(),
            is_sentence: false,
        }
    }

    fn same_span(&self, other: &SectionNode) -> bool {
        self.start == other.start && self.ending == other.ending
    }

    fn contains(&self, other: &SectionNode) -> bool {
        self.start <= other.start && other.ending <= self.ending
    }

    /// Insere um span na subárvore deste nó.
    pub fn insert(&mut self, mut new: SectionNode) -> Result<()> {
        if self.children.is_empty() {
            self.children.push(new);
            return Ok(());
        }

        if let Some(pos) = self.children.iter().position(|c| c.contains(&new)) {
            let parent = &mut self.children[pos];
            if !parent.same_span(&new) {
                return parent.insert(new);
            }
            // Mesmo span: tipos iguais são deduplicados
            if normalize_section_kind(&parent.kind) != normalize_section_kind(&new.kind) {
                new.children = std::mem::take(&mut parent.children);
                if equivalent_kind_order(&new.kind) < equivalent_kind_order(&parent.kind) {
                    std::mem::swap(&mut parent.kind, &mut new.kind);
                }
                parent.children = vec![new];
            }
            return Ok(());
        }

        let len = self.children.len();
        if new.ending <= self.children[0].start {
            self.children.insert(0, new);
        } else if self.children[len - 1].ending <= new.start {
            self.children.push(new);
        } else if let Some(i) = (1..len).find(|&i| {
            self.children[i - 1].ending <= new.start && new.ending <= self.children[i].start
        }) {
            self.children.insert(i, new);
        } else {
            // O novo span envolve uma sequência contígua de filhos
            let first = (0..len).find(|&i| {
                (i == 0 || self.children[i - 1].ending <= new.start)
                    && new.start <= self.children[i].start
            });
            let last = (0..len).find(|&i| {
                self.children[i].ending <= new.ending
                    && (i + 1 == len || new.ending <= self.children[i + 1].start)
            });
            match (first, last) {
                (Some(first), Some(last)) if first <= last => {
                    new.children = self.children.drain(first..=last).collect();
                    self.children.insert(first, new);
                }
                _ => {
                    return Err(ConversionError::NonHierarchicalOverlap {
                        start: new.start,
                        ending: new.ending,
                        kind: new.kind,
                    })
                }
            }
        }
        Ok(())
    }

    fn mark_sentences(&mut self) {
        if normalize_section_kind(&self.kind) == SENTENCE_KIND {
            if self.children.is_empty() {
                self.is_sentence = true;
            } else {
                self.kind = SENTENCE_WRAPPER_KIND.to_string();
            }
        } else if self.children.is_empty() {
            self.children
                .push(SectionNode::new(self.start, self.ending, SENTENCE_KIND));
        }
        for child in &mut self.children {
            child.mark_sentences();
        }
    }

    /// Coleta os nós que viram `Section` (filhos = sentenças), de baixo para cima.
    fn collect_sections(self, out: &mut Vec<SectionNode>) {
        let has_sentence = self.children.iter().any(|c| c.is_sentence);
        if has_sentence && self.children.iter().all(|c| c.is_sentence) {
            out.push(self);
            return;
        }

        let mut run: Vec<SectionNode> = Vec::new();
        for child in self.children {
            if child.is_sentence {
                run.push(child);
                continue;
            }
            flush_sentence_run(&mut run, out);
            child.collect_sections(out);
        }
        flush_sentence_run(&mut run, out);
    }
}

fn flush_sentence_run(run: &mut Vec<SectionNode>, out: &mut Vec<SectionNode>) {
    if let (Some(first), Some(last)) = (run.first(), run.last()) {
        let mut group = SectionNode::new(first.start, last.ending, UNKNOWN_KIND);
        group.children = std::mem::take(run);
        out.push(group);
    }
}

/// Monta a árvore de intervalos (passos 1 e 2), sem sentenças/tokens Concrete.
pub fn build_section_tree(segment_sections: &[SegmentSection], text_len: usize) -> Result<SectionNode> {
    let mut root = SectionNode::new(0, text_len, UNKNOWN_KIND);
    for section in segment_sections {
        if section.start > section.end || section.end > text_len {
            return Err(ConversionError::InvalidOffset {
                offset: section.end.max(section.start),
                len: text_len,
            });
        }
        root.insert(SectionNode::new(
            section.start,
            section.end,
            section.structural_element.clone(),
        ))?;
    }
    root.mark_sentences();
    Ok(root)
}

/// Onde um token global de entrada foi parar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPlacement {
    pub tokenization: ConcreteUuid,
    pub token_index: usize,
}

/// Resultado da construção: seções ordenadas + destino de cada token de entrada
/// (`None` para tokens descartados).
#[derive(Debug, Clone, PartialEq)]
pub struct SectionHierarchy {
    pub sections: Vec<Section>,
    pub placements: Vec<Option<TokenPlacement>>,
}

/// Constrói as seções Concrete a partir das seções planas e de `tok2char`.
pub fn build_sections(
    segment_sections: &[SegmentSection],
    tok2char: &[Vec<usize>],
    text: &str,
    uuid_generator: &dyn UuidGenerator,
) -> Result<SectionHierarchy> {
    let chars: Vec<char> = text.chars().collect();
    let root = build_section_tree(segment_sections, chars.len())?;

    let mut flat = Vec::new();
    root.collect_sections(&mut flat);
    flat.sort_by_key(|node| node.start);

    let mut sections: Vec<Section> = flat
        .into_iter()
        .map(|node| {
            let kind = if node.kind == SENTENCE_WRAPPER_KIND {
                UNKNOWN_KIND.to_string()
            } else {
                node.kind
            };
            let sentences = node
                .children
                .iter()
                .map(|sentence| {
                    Sentence::new(
                        uuid_generator.generate(),
                        TextSpan::new(sentence.start, sentence.ending),
                        Tokenization::new(uuid_generator.generate()),
                    )
                })
                .collect();
            Section::new(
                uuid_generator.generate(),
                kind,
                TextSpan::new(node.start, node.ending),
                sentences,
            )
        })
        .collect();

    // Caractere → (seção, sentença)
    let mut owner: Vec<Option<(usize, usize)>> = vec![None; chars.len()];
    for (si, section) in sections.iter().enumerate() {
        for (ti, sentence) in section.sentence_list.iter().enumerate() {
            for c in sentence.text_span.start..sentence.text_span.ending.min(chars.len()) {
                owner[c] = Some((si, ti));
            }
        }
    }

    let mut placements = Vec::with_capacity(tok2char.len());
    for indices in tok2char {
        let (first, last) = match (indices.first(), indices.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                debug!("ignorando entrada vazia de tok2char");
                placements.push(None);
                continue;
            }
        };
        if let Some(&c) = indices.iter().find(|&&c| c >= chars.len()) {
            return Err(ConversionError::InvalidOffset {
                offset: c,
                len: chars.len(),
            });
        }
        let start = first;
        let ending = last + 1;

        let placement = match (owner[start], owner[ending - 1]) {
            (Some(a), Some(b)) if a == b => {
                let text: String = indices.iter().map(|&c| chars[c]).collect();
                if text.chars().count() != ending.saturating_sub(start) {
                    return Err(ConversionError::TokenTextMismatch { start, ending });
                }
                let tokenization = &mut sections[a.0].sentence_list[a.1].tokenization;
                let token_index = tokenization.token_list.token_list.len();
                tokenization
                    .token_list
                    .token_list
                    .push(Token::new(token_index, text, start, ending));
                Some(TokenPlacement {
                    tokenization: tokenization.uuid.clone(),
                    token_index,
                })
            }
            (Some(_), Some(_)) => {
                warn!(token_start = start, token_end = ending, "ignorando token que abrange várias sentenças");
                None
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!(token_start = start, token_end = ending, "ignorando token que cruza uma fronteira de sentença");
                None
            }
            (None, None) => {
                warn!(token_start = start, token_end = ending, "ignorando token fora de qualquer sentença");
                None
            }
        };
        placements.push(placement);
    }

    Ok(SectionHierarchy {
        sections,
        placements,
    })
}
