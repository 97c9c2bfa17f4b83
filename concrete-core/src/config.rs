//! Opções da conversão Concrete ⇄ BP-JSON.

use serde::{Deserialize, Serialize};

/// `situationType` usado para templates granulares.
pub const DEFAULT_TEMPLATE_SITUATION_TYPE: &str = "EVENT_TEMPLATE";

/// Parâmetros de conversão.
///
/// - `template_situation_type`: tipo de situação que representa templates.
/// - `entity_set_tool` / `situation_set_tool`: quando presentes, escolhem o
///   EntitySet / SituationSet pela ferramenta (`metadata.tool`) que o gerou.
///   Depois do filtro deve sobrar exatamente um conjunto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    pub template_situation_type: String,
    pub entity_set_tool: Option<String>,
    pub situation_set_tool: Option<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            template_situation_type: DEFAULT_TEMPLATE_SITUATION_TYPE.to_string(),
            entity_set_tool: None,
            situation_set_tool: None,
        }
    }
}

impl ConversionOptions {
    pub fn with_template_situation_type(mut self, situation_type: impl Into<String>) -> Self {
        self.template_situation_type = situation_type.into();
        self
    }

    pub fn with_entity_set_tool(mut self, tool: impl Into<String>) -> Self {
        self.entity_set_tool = Some(tool.into());
        self
    }

    pub fn with_situation_set_tool(mut self, tool: impl Into<String>) -> Self {
        self.situation_set_tool = Some(tool.into());
        self
    }
}
