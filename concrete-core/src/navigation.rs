//! # Navegação em Communications
//!
//! Consultas utilitárias sobre uma [`Communication`] já montada: listas planas
//! de seções/sentenças/tokenizations e buscas por UUID, por nome de ferramenta
//! ou por id de entidade. Todas as buscas retornam `Option` e fazem varredura
//! linear; para muitas consultas no mesmo documento use
//! [`crate::linker::add_internal_references`].

use crate::ids::ConcreteUuid;
use crate::model::{
    Communication, Entity, EntityMention, EntityMentionSet, Section, Sentence, SituationMention,
    Tokenization,
};

impl Communication {
    pub fn sections(&self) -> Vec<&Section> {
        self.section_list.iter().collect()
    }

    /// Todas as sentenças em ordem de documento.
    pub fn sentences(&self) -> Vec<&Sentence> {
        self.section_list
            .iter()
            .flat_map(|section| section.sentence_list.iter())
            .collect()
    }

    /// Todas as tokenizations em ordem de documento (uma por sentença).
    pub fn tokenizations(&self) -> Vec<&Tokenization> {
        self.sentences()
            .into_iter()
            .map(|sentence| &sentence.tokenization)
            .collect()
    }

    pub fn first_sentence(&self) -> Option<&Sentence> {
        self.section_list
            .iter()
            .find_map(|section| section.sentence_list.first())
    }

    pub fn first_tokenization(&self) -> Option<&Tokenization> {
        self.first_sentence().map(|sentence| &sentence.tokenization)
    }

    pub fn sentence_with_uuid(&self, uuid: &ConcreteUuid) -> Option<&Sentence> {
        self.sentences()
            .into_iter()
            .find(|sentence| &sentence.uuid == uuid)
    }

    pub fn tokenization_with_uuid(&self, uuid: &ConcreteUuid) -> Option<&Tokenization> {
        self.tokenizations()
            .into_iter()
            .find(|tokenization| &tokenization.uuid == uuid)
    }

    pub fn entity_mention_with_uuid(&self, uuid: &ConcreteUuid) -> Option<&EntityMention> {
        self.entity_mention_set_list
            .iter()
            .flat_map(|set| set.mention_list.iter())
            .find(|mention| &mention.uuid == uuid)
    }

    pub fn situation_mention_with_uuid(&self, uuid: &ConcreteUuid) -> Option<&SituationMention> {
        self.situation_mention_set_list
            .iter()
            .flat_map(|set| set.mention_list.iter())
            .find(|mention| &mention.uuid == uuid)
    }

    /// Entidade cujo `mentionIdList` contém a menção indicada.
    pub fn entity_for_entity_mention_uuid(&self, uuid: &ConcreteUuid) -> Option<&Entity> {
        self.entity_set_list
            .iter()
            .flat_map(|set| set.entity_list.iter())
            .find(|entity| entity.mention_id_list.contains(uuid))
    }

    /// Entidade pelo `id` textual (não pelo UUID).
    pub fn entity_with_entity_id(&self, entity_id: &str) -> Option<&Entity> {
        self.entity_set_list
            .iter()
            .flat_map(|set| set.entity_list.iter())
            .find(|entity| entity.id.as_deref() == Some(entity_id))
    }

    /// Primeiro EntityMentionSet produzido pela ferramenta indicada.
    pub fn entity_mention_set_with_toolname(&self, tool: &str) -> Option<&EntityMentionSet> {
        self.entity_mention_set_list
            .iter()
            .find(|set| set.metadata.tool == tool)
    }

    /// Textos dos tokens referenciados pela menção, em ordem.
    pub fn tokens_for_entity_mention(&self, uuid: &ConcreteUuid) -> Option<Vec<&str>> {
        let mention = self.entity_mention_with_uuid(uuid)?;
        let tokenization = self.tokenization_with_uuid(&mention.tokens.tokenization_id)?;
        mention
            .tokens
            .token_index_list
            .iter()
            .map(|&index| {
                tokenization
                    .tokens()
                    .iter()
                    .find(|token| token.token_index == index)
                    .map(|token| token.text.as_str())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::ids::{AnnotationMetadata, ConcreteUuid, SequentialUuidGenerator, UuidGenerator};
    use crate::model::*;

    fn sample() -> Communication {
        let gen = SequentialUuidGenerator::new();
        let mut comm = Communication::new("doc", gen.generate(), "story", "Lula viajou. Fim.");
        let tok1 = Tokenization::with_tokens(
            ConcreteUuid::new("tok-1"),
            vec![
                Token::new(0, "Lula", 0, 4),
                Token::new(1, "viajou", 5, 11),
                Token::new(2, ".", 11, 12),
            ],
        );
        let tok2 = Tokenization::with_tokens(
            ConcreteUuid::new("tok-2"),
            vec![Token::new(0, "Fim", 13, 16), Token::new(1, ".", 16, 17)],
        );
        comm.section_list.push(Section::new(
            gen.generate(),
            "Headline",
            TextSpan::new(0, 12),
            vec![Sentence::new(ConcreteUuid::new("sent-1"), TextSpan::new(0, 12), tok1)],
        ));
        comm.section_list.push(Section::new(
            gen.generate(),
            "Unknown",
            TextSpan::new(13, 17),
            vec![Sentence::new(ConcreteUuid::new("sent-2"), TextSpan::new(13, 17), tok2)],
        ));

        let mention = EntityMention::new(
            ConcreteUuid::new("m-1"),
            TokenRefSequence {
                token_index_list: vec![0],
                anchor_token_index: None,
                tokenization_id: ConcreteUuid::new("tok-1"),
            },
        );
        comm.entity_mention_set_list.push(EntityMentionSet {
            uuid: gen.generate(),
            metadata: AnnotationMetadata::now("ner"),
            mention_list: vec![mention],
        });
        comm.entity_set_list.push(EntitySet {
            uuid: gen.generate(),
            metadata: AnnotationMetadata::stub(),
            entity_list: vec![Entity::new(
                ConcreteUuid::new("e-1"),
                Some("ss-lula".to_string()),
                vec![ConcreteUuid::new("m-1")],
            )],
        });
        comm
    }

    #[test]
    fn test_flat_lists() {
        let comm = sample();
        assert_eq!(comm.sections().len(), 2);
        assert_eq!(comm.sentences().len(), 2);
        assert_eq!(comm.tokenizations()[1].uuid, ConcreteUuid::new("tok-2"));
        assert_eq!(comm.first_sentence().unwrap().uuid, ConcreteUuid::new("sent-1"));
        assert_eq!(comm.first_tokenization().unwrap().tokens().len(), 3);
    }

    #[test]
    fn test_lookups() {
        let comm = sample();
        assert!(comm.sentence_with_uuid(&ConcreteUuid::new("sent-2")).is_some());
        assert!(comm.tokenization_with_uuid(&ConcreteUuid::new("sent-2")).is_none());
        let entity = comm
            .entity_for_entity_mention_uuid(&ConcreteUuid::new("m-1"))
            .unwrap();
        assert_eq!(entity.id.as_deref(), Some("ss-lula"));
        assert_eq!(
            comm.entity_with_entity_id("ss-lula").unwrap().uuid,
            ConcreteUuid::new("e-1")
        );
        assert!(comm.entity_mention_set_with_toolname("ner").is_some());
        assert!(comm.entity_mention_set_with_toolname("outra").is_none());
        assert!(comm
            .situation_mention_with_uuid(&ConcreteUuid::new("m-1"))
            .is_none());
    }

    #[test]
    fn test_tokens_for_entity_mention() {
        let comm = sample();
        assert_eq!(
            comm.tokens_for_entity_mention(&ConcreteUuid::new("m-1")),
            Some(vec!["Lula"])
        );
    }

    #[test]
    fn test_empty_communication() {
        let comm = Communication::new("vazio", ConcreteUuid::new("c"), "story", "");
        assert!(comm.first_sentence().is_none());
        assert!(comm.tokenizations().is_empty());
    }
}
