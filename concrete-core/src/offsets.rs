//! # Índice de Offsets
//!
//! O BP-JSON endereça o texto de duas formas que precisam ser mantidas em
//! sincronia:
//!
//! - `tok2char[t]`: índices de caractere cobertos pelo token global `t`;
//! - `char2tok[c]`: tokens globais que cobrem o caractere `c` (vazio se nenhum).
//!
//! Já o Concrete numera tokens **localmente** em cada Tokenization. O índice
//! guarda, para cada Tokenization, o offset global do seu primeiro token, o
//! que permite converter `(tokenization, índice local)` em índice global.
//!
//! Garantia: `c ∈ tok2char[t] ⟺ t ∈ char2tok[c]`.

use std::collections::HashMap;

use crate::error::{ConversionError, Result};
use crate::ids::ConcreteUuid;
use crate::model::{Communication, TextSpan};

/// Tabelas de offset de um documento. Construídas uma vez, somente leitura depois.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetIndex {
    pub tok2char: Vec<Vec<usize>>,
    pub char2tok: Vec<Vec<usize>>,
    token_offsets: HashMap<ConcreteUuid, usize>,
}

impl OffsetIndex {
    /// Percorre seções → sentenças → tokens em ordem de documento.
    pub fn build(communication: &Communication) -> Result<Self> {
        let text_len = communication.text.chars().count();
        let sentences = communication.sentences();

        let tok2char: Vec<Vec<usize>> = sentences
            .iter()
            .flat_map(|sentence| sentence.tokenization.tokens())
            .map(|token| (token.text_span.start..token.text_span.ending).collect())
            .collect();
        let char2tok = Self::invert(&tok2char, text_len)?;

        // Offset global do primeiro token de cada Tokenization (acumulado em fold)
        let (token_offsets, _) = sentences.iter().fold(
            (HashMap::new(), 0usize),
            |(mut offsets, next), sentence| {
                offsets.insert(sentence.tokenization.uuid.clone(), next);
                (offsets, next + sentence.tokenization.tokens().len())
            },
        );

        Ok(Self {
            tok2char,
            char2tok,
            token_offsets,
        })
    }

    /// Deriva `char2tok` a partir de um `tok2char` arbitrário.
    pub fn from_tok2char(tok2char: Vec<Vec<usize>>, text_len: usize) -> Result<Self> {
        let char2tok = Self::invert(&tok2char, text_len)?;
        Ok(Self {
            tok2char,
            char2tok,
            token_offsets: HashMap::new(),
        })
    }

    fn invert(tok2char: &[Vec<usize>], text_len: usize) -> Result<Vec<Vec<usize>>> {
        let mut char2tok = vec![Vec::new(); text_len];
        for (token, chars) in tok2char.iter().enumerate() {
            for &c in chars {
                let slot = char2tok.get_mut(c).ok_or(ConversionError::InvalidOffset {
                    offset: c,
                    len: text_len,
                })?;
                slot.push(token);
            }
        }
        Ok(char2tok)
    }

    /// Offset global do primeiro token da Tokenization.
    pub fn token_offset(&self, tokenization: &ConcreteUuid) -> Option<usize> {
        self.token_offsets.get(tokenization).copied()
    }

    /// Converte `(tokenization, índice local)` em índice global.
    pub fn global_token_index(&self, tokenization: &ConcreteUuid, local: usize) -> Result<usize> {
        self.token_offset(tokenization)
            .map(|offset| offset + local)
            .ok_or_else(|| ConversionError::missing("tokenization", tokenization.as_str()))
    }

    /// Texto de superfície de cada token (`segment-text-tok`).
    pub fn segment_text_tok(&self, chars: &[char]) -> Result<Vec<String>> {
        self.tok2char
            .iter()
            .map(|indices| {
                indices
                    .iter()
                    .map(|&c| {
                        chars.get(c).copied().ok_or(ConversionError::InvalidOffset {
                            offset: c,
                            len: chars.len(),
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Fatia o texto (já decomposto em `char`s) por um intervalo de caracteres.
pub fn char_slice(chars: &[char], span: TextSpan) -> Result<String> {
    if span.start > span.ending || span.ending > chars.len() {
        return Err(ConversionError::InvalidOffset {
            offset: span.ending.max(span.start),
            len: chars.len(),
        });
    }
    Ok(chars[span.start..span.ending].iter().collect())
}
