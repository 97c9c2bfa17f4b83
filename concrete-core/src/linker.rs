//! # Referências Internas do Documento
//!
//! As camadas de anotação do Concrete apontam umas para as outras apenas por
//! UUID. [`add_internal_references`] percorre uma Communication completa uma
//! única vez e monta mapas UUID → objeto, além dos mapas inversos (sentença →
//! seção, menção → entidade, ...). A Communication nunca é modificada.

use std::collections::HashMap;

use crate::error::{ConversionError, Result};
use crate::ids::ConcreteUuid;
use crate::model::{
    Argument, Communication, Entity, EntityMention, MentionArgument, Property, Section, Sentence,
    Situation, SituationMention, Tokenization,
};

type UuidMap<'a, T> = HashMap<&'a ConcreteUuid, &'a T>;

/// Mapas de navegação de uma Communication.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InternalReferences<'a> {
    pub entity_for_uuid: UuidMap<'a, Entity>,
    pub entity_mention_for_uuid: UuidMap<'a, EntityMention>,
    pub section_for_uuid: UuidMap<'a, Section>,
    pub sentence_for_uuid: UuidMap<'a, Sentence>,
    pub situation_for_uuid: UuidMap<'a, Situation>,
    pub situation_mention_for_uuid: UuidMap<'a, SituationMention>,
    pub tokenization_for_uuid: UuidMap<'a, Tokenization>,

    /// UUID da sentença → seção que a contém
    pub section_for_sentence: UuidMap<'a, Section>,
    /// UUID da tokenization → sentença dona
    pub sentence_for_tokenization: UuidMap<'a, Sentence>,
    /// UUID da menção → entidade que a lista
    pub entity_for_mention: UuidMap<'a, Entity>,
    /// UUID da menção filha → menção pai
    pub parent_entity_mention: UuidMap<'a, EntityMention>,
    /// UUID da menção de situação → situação que a lista
    pub situation_for_mention: UuidMap<'a, Situation>,
}

/// Preenchimento resolvido de um [`Argument`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentFill<'a> {
    Entity(&'a Entity),
    Situation(&'a Situation),
    Properties(&'a [Property]),
}

/// Preenchimento resolvido de um [`MentionArgument`].
#[derive(Debug, Clone, PartialEq)]
pub enum MentionArgumentFill<'a> {
    EntityMention(&'a EntityMention),
    SituationMention(&'a SituationMention),
}

pub fn add_internal_references(communication: &Communication) -> InternalReferences<'_> {
    let mut refs = InternalReferences::default();

    for section in &communication.section_list {
        refs.section_for_uuid.insert(&section.uuid, section);
        for sentence in &section.sentence_list {
            refs.sentence_for_uuid.insert(&sentence.uuid, sentence);
            refs.section_for_sentence.insert(&sentence.uuid, section);
            refs.tokenization_for_uuid
                .insert(&sentence.tokenization.uuid, &sentence.tokenization);
            refs.sentence_for_tokenization
                .insert(&sentence.tokenization.uuid, sentence);
        }
    }

    for mention in communication
        .entity_mention_set_list
        .iter()
        .flat_map(|set| &set.mention_list)
    {
        refs.entity_mention_for_uuid.insert(&mention.uuid, mention);
        for child in &mention.child_mention_id_list {
            refs.parent_entity_mention.insert(child, mention);
        }
    }

    for entity in communication
        .entity_set_list
        .iter()
        .flat_map(|set| &set.entity_list)
    {
        refs.entity_for_uuid.insert(&entity.uuid, entity);
        for mention_id in &entity.mention_id_list {
            refs.entity_for_mention.insert(mention_id, entity);
        }
    }

    for mention in communication
        .situation_mention_set_list
        .iter()
        .flat_map(|set| &set.mention_list)
    {
        refs.situation_mention_for_uuid.insert(&mention.uuid, mention);
    }

    for situation in communication
        .situation_set_list
        .iter()
        .flat_map(|set| &set.situation_list)
    {
        refs.situation_for_uuid.insert(&situation.uuid, situation);
        for mention_id in &situation.mention_id_list {
            refs.situation_for_mention.insert(mention_id, situation);
        }
    }

    refs
}

fn lookup<'a, T>(map: &UuidMap<'a, T>, uuid: &ConcreteUuid, kind: &str) -> Result<&'a T> {
    map.get(uuid)
        .copied()
        .ok_or_else(|| ConversionError::missing(kind, uuid.as_str()))
}

impl<'a> InternalReferences<'a> {
    pub fn entity(&self, uuid: &ConcreteUuid) -> Result<&'a Entity> {
        lookup(&self.entity_for_uuid, uuid, "entidade")
    }

    pub fn entity_mention(&self, uuid: &ConcreteUuid) -> Result<&'a EntityMention> {
        lookup(&self.entity_mention_for_uuid, uuid, "menção de entidade")
    }

    pub fn situation(&self, uuid: &ConcreteUuid) -> Result<&'a Situation> {
        lookup(&self.situation_for_uuid, uuid, "situação")
    }

    pub fn situation_mention(&self, uuid: &ConcreteUuid) -> Result<&'a SituationMention> {
        lookup(&self.situation_mention_for_uuid, uuid, "menção de situação")
    }

    pub fn tokenization(&self, uuid: &ConcreteUuid) -> Result<&'a Tokenization> {
        lookup(&self.tokenization_for_uuid, uuid, "tokenization")
    }

    /// Tokenization referenciada pela menção.
    pub fn tokenization_for_mention(&self, mention: &EntityMention) -> Result<&'a Tokenization> {
        self.tokenization(&mention.tokens.tokenization_id)
    }

    /// Resolve o preenchimento de um argumento de situação.
    pub fn resolve_argument(&self, argument: &'a Argument) -> Result<ArgumentFill<'a>> {
        match (&argument.entity_id, &argument.situation_id) {
            (Some(_), Some(_)) => Err(ConversionError::AmbiguousArgument {
                role: argument.role.clone(),
            }),
            (Some(entity_id), None) => self.entity(entity_id).map(ArgumentFill::Entity),
            (None, Some(situation_id)) => self.situation(situation_id).map(ArgumentFill::Situation),
            (None, None) => Ok(ArgumentFill::Properties(&argument.property_list)),
        }
    }

    /// Resolve o preenchimento de um argumento de menção de situação.
    pub fn resolve_mention_argument(
        &self,
        argument: &MentionArgument,
    ) -> Result<MentionArgumentFill<'a>> {
        match (&argument.entity_mention_id, &argument.situation_mention_id) {
            (Some(id), None) => self.entity_mention(id).map(MentionArgumentFill::EntityMention),
            (None, Some(id)) => self
                .situation_mention(id)
                .map(MentionArgumentFill::SituationMention),
            (Some(_), Some(_)) => Err(ConversionError::AmbiguousArgument {
                role: argument.role.clone(),
            }),
            (None, None) => Err(ConversionError::MissingArgumentFill {
                role: argument.role.clone(),
                expected: "menção".to_string(),
            }),
        }
    }
}
