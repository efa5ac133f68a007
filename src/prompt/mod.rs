mod engine;
pub mod templates;

pub use engine::TeraEngine;

use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::error::PromptError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PromptTemplate {
    Selection,
    Coaching,
    Motivation,
}

impl PromptTemplate {
    fn source(self) -> &'static str {
        match self {
            Self::Selection => templates::SELECTION,
            Self::Coaching => templates::COACHING,
            Self::Motivation => templates::MOTIVATION,
        }
    }
}

/// The built-in prompt set, compiled once and shared.
pub struct PromptLibrary {
    engine: TeraEngine,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, PromptError> {
        let mut engine = TeraEngine::new();
        for template in PromptTemplate::iter() {
            engine.add_template(template.into(), template.source())?;
        }
        Ok(Self { engine })
    }

    pub fn system_prompt(&self) -> &'static str {
        templates::SYSTEM_PROMPT
    }

    pub fn render<T: Serialize>(
        &self,
        template: PromptTemplate,
        data: &T,
    ) -> Result<String, PromptError> {
        let context = tera::Context::from_serialize(data)?;
        self.engine.render(template.into(), &context)
    }
}
