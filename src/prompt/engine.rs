use tera::Tera;

use crate::error::PromptError;

/// Tera-backed template engine for building structured prompts.
pub struct TeraEngine {
    tera: Tera,
}

impl TeraEngine {
    /// Create with inline templates (no filesystem).
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
        }
    }

    /// Register a template from a string.
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<(), PromptError> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a named template with the given context.
    pub fn render(&self, template_name: &str, context: &tera::Context) -> Result<String, PromptError> {
        if !self.has_template(template_name) {
            return Err(PromptError::NotFound(template_name.to_string()));
        }
        Ok(self.tera.render(template_name, context)?)
    }
}

impl Default for TeraEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::Context;

    #[test]
    fn missing_template_is_not_found() {
        let engine = TeraEngine::new();
        let err = engine.render("nonexistent", &Context::new()).unwrap_err();
        assert!(matches!(err, PromptError::NotFound(name) if name == "nonexistent"));
    }

    #[test]
    fn add_template_and_render() {
        let mut engine = TeraEngine::new();
        engine.add_template("greeting", "Hello, {{ name }}!").unwrap();

        let mut ctx = Context::new();
        ctx.insert("name", "World");
        assert_eq!(engine.render("greeting", &ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn render_missing_variable_fails() {
        let mut engine = TeraEngine::new();
        engine.add_template("greeting", "Hello, {{ name }}!").unwrap();

        let err = engine.render("greeting", &Context::new()).unwrap_err();
        assert!(matches!(err, PromptError::Render(_)));
    }

    #[test]
    fn malformed_template_is_rejected() {
        let mut engine = TeraEngine::new();
        assert!(engine.add_template("bad", "{% if %}").is_err());
    }

    #[test]
    fn render_with_loop() {
        let mut engine = TeraEngine::new();
        engine
            .add_template("list", "{% for item in items %}- {{ item }}\n{% endfor %}")
            .unwrap();

        let mut ctx = Context::new();
        ctx.insert("items", &vec!["alpha", "beta"]);
        assert_eq!(engine.render("list", &ctx).unwrap(), "- alpha\n- beta\n");
    }
}
