//! Personas - fixed instruction sets sharing one language model
//!
//! Each persona pairs a system instruction with a prompt template. The user's
//! text is interpolated at `{input}`. The built-in catalog holds the four
//! support personas; a TOML file can override any of them by `kind`.

use serde::{Deserialize, Serialize};
use solace_llm::{Error, ErrorKind, Result};
use std::fmt;
use std::path::Path;

/// Catalog format understood by this build
pub const CATALOG_VERSION: u32 = 1;

/// Placeholder replaced by the user's text
pub const INPUT_PLACEHOLDER: &str = "{input}";

const MARKDOWN_INSTRUCTION: &str = "Use markdown to format your answers.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaKind {
    Therapist,
    Closure,
    RecoveryPlanner,
    Stoic,
}

impl PersonaKind {
    /// Invocation and presentation order
    pub const ORDER: [PersonaKind; 4] = [
        PersonaKind::Therapist,
        PersonaKind::Closure,
        PersonaKind::RecoveryPlanner,
        PersonaKind::Stoic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaKind::Therapist => "therapist",
            PersonaKind::Closure => "closure",
            PersonaKind::RecoveryPlanner => "recovery_planner",
            PersonaKind::Stoic => "stoic",
        }
    }

    /// Label shown while this persona's call is in flight
    pub fn progress_label(&self) -> &'static str {
        match self {
            PersonaKind::Therapist => "Getting empathetic support",
            PersonaKind::Closure => "Getting closure messages",
            PersonaKind::RecoveryPlanner => "Creating a recovery schedule",
            PersonaKind::Stoic => "Getting honest opinion",
        }
    }
}

impl fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persona: name, heading, fixed instructions and a prompt template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub kind: PersonaKind,
    pub name: String,
    pub heading: String,
    pub instructions: String,
    pub prompt_template: String,
    #[serde(default = "default_markdown")]
    pub markdown: bool,
}

fn default_markdown() -> bool {
    true
}

impl Persona {
    /// Build the per-call prompt for this persona
    pub fn render_prompt(&self, input: &str) -> String {
        self.prompt_template.replace(INPUT_PLACEHOLDER, input)
    }

    /// System instruction sent ahead of the prompt
    pub fn system_instruction(&self) -> String {
        if self.markdown {
            format!("{}\n\n{}", self.instructions.trim(), MARKDOWN_INSTRUCTION)
        } else {
            self.instructions.trim().to_string()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config_invalid("persona name is empty")
                .with_context("persona", self.kind.as_str()));
        }
        if self.instructions.trim().is_empty() {
            return Err(Error::config_invalid("persona instructions are empty")
                .with_context("persona", self.kind.as_str()));
        }
        if !self.prompt_template.contains(INPUT_PLACEHOLDER) {
            return Err(Error::config_invalid(format!(
                "prompt template must contain {}",
                INPUT_PLACEHOLDER
            ))
            .with_context("persona", self.kind.as_str()));
        }
        Ok(())
    }
}

/// Versioned set of the four personas, always in invocation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaCatalog {
    version: u32,
    personas: Vec<Persona>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: u32,
    #[serde(default, rename = "persona")]
    personas: Vec<Persona>,
}

impl PersonaCatalog {
    /// The four personas as shipped
    pub fn builtin() -> Self {
        Self {
            version: CATALOG_VERSION,
            personas: PersonaKind::ORDER.iter().map(|k| builtin_persona(*k)).collect(),
        }
    }

    /// Parse a TOML catalog; kinds it leaves out keep their built-in text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| {
            Error::config_invalid("invalid persona catalog")
                .with_operation("persona::from_toml_str")
                .set_source(e)
        })?;

        if file.version != CATALOG_VERSION {
            return Err(Error::config_invalid(format!(
                "unsupported persona catalog version {} (expected {})",
                file.version, CATALOG_VERSION
            ))
            .with_operation("persona::from_toml_str"));
        }

        let mut catalog = Self::builtin();
        for persona in file.personas {
            persona.validate().map_err(|e| e.with_operation("persona::from_toml_str"))?;
            if let Some(slot) = catalog.personas.iter_mut().find(|p| p.kind == persona.kind) {
                *slot = persona;
            }
        }
        Ok(catalog)
    }

    /// Load a catalog file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("persona::load")
                .with_context("path", path.display().to_string())
        })?;
        Self::from_toml_str(&content).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn get(&self, kind: PersonaKind) -> Option<&Persona> {
        self.personas.iter().find(|p| p.kind == kind)
    }

    /// Personas in invocation order
    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    /// Check that all four kinds are present, in order, and well-formed
    pub fn validate(&self) -> Result<()> {
        if self.personas.len() != PersonaKind::ORDER.len() {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                format!("expected {} personas, found {}", PersonaKind::ORDER.len(), self.personas.len()),
            ));
        }
        for (persona, kind) in self.personas.iter().zip(PersonaKind::ORDER) {
            if persona.kind != kind {
                return Err(Error::config_invalid("personas out of order")
                    .with_context("expected", kind.as_str())
                    .with_context("found", persona.kind.as_str()));
            }
            persona.validate()?;
        }
        Ok(())
    }
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_persona(kind: PersonaKind) -> Persona {
    let (name, heading, instructions, prompt_template) = match kind {
        PersonaKind::Therapist => (
            "Therapist Agent",
            "Emotional Support",
            "You are an empathetic therapist that:
1. Listens with empathy and validates feelings
2. Uses gentle humor to lighten the mood
3. Shares relatable breakup experiences
4. Offers comforting words and encouragement
5. Analyzes both text and image inputs for emotional context
Be supportive and understanding in your responses",
            "Analyze the emotional state and provide empathetic support based on:
User's message: {input}
Please provide a compassionate response with:
1. Validation of feelings
2. Gentle words of comfort
3. Relatable experiences
4. Words of encouragement",
        ),
        PersonaKind::Closure => (
            "Closure Agent",
            "Finding Closure",
            "You are an expert in helping people find closure through words. Your role involves:
1. Guiding users in conveying raw, genuine emotions honestly and openly
Your primary focus is to help individuals experience emotional relief and closure through honest, well-crafted expression.",
            "Help create emotional closure based on:
User's feelings: {input}

Please provide the following:
1. Template for unsent messages.
2. Emotional release exercises.",
        ),
        PersonaKind::RecoveryPlanner => (
            "Recovery Planner Agent",
            "Your 7-Day Recovery Plan",
            "You are a recovery routine planner. Your role involves:
1. Design a 7-Day recovery schedule.
Focus on practical recovery steps.",
            "Design a 7-Day recovery plan based on:
Current state: {input}
Include the following:
1. Daily activities and challenges to motivate one.
2. Self-care routines.",
        ),
        PersonaKind::Stoic => (
            "Stoic Agent",
            "Honest Perspective",
            "You are a Stoic guide, rooted in logic, realism, and emotional discipline. Your role is to:
1. Provide blunt, honest, and realistic advice, free from sugar-coating.
2. When offering guidance, draw from the timeless wisdom of Stoic thinkers like Marcus Aurelius, Seneca, and Epictetus.
Your purpose is to help others face reality as it is, with strength, reason, and a clear mind.",
            "Provide honest, constructive opinion about:
situation: {input}",
        ),
    };

    Persona {
        kind,
        name: name.to_string(),
        heading: heading.to_string(),
        instructions: instructions.to_string(),
        prompt_template: prompt_template.to_string(),
        markdown: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let catalog = PersonaCatalog::builtin();
        let kinds: Vec<_> = catalog.personas().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, PersonaKind::ORDER.to_vec());
        assert_eq!(catalog.version(), CATALOG_VERSION);
        catalog.validate().unwrap();
    }

    #[test]
    fn test_render_prompt() {
        let catalog = PersonaCatalog::builtin();
        let stoic = catalog.get(PersonaKind::Stoic).unwrap();
        assert_eq!(
            stoic.render_prompt("she left"),
            "Provide honest, constructive opinion about:\nsituation: she left"
        );

        let therapist = catalog.get(PersonaKind::Therapist).unwrap();
        assert!(therapist.render_prompt("I feel lost").contains("User's message: I feel lost"));
    }

    #[test]
    fn test_system_instruction_markdown_flag() {
        let mut persona = PersonaCatalog::builtin().get(PersonaKind::Closure).unwrap().clone();
        assert!(persona.system_instruction().ends_with(MARKDOWN_INSTRUCTION));

        persona.markdown = false;
        assert!(!persona.system_instruction().contains(MARKDOWN_INSTRUCTION));
    }

    #[test]
    fn test_toml_override_keeps_other_defaults() {
        let catalog = PersonaCatalog::from_toml_str(
            r#"
version = 1

[[persona]]
kind = "stoic"
name = "Seneca"
heading = "Letters"
instructions = "Write like Seneca."
prompt_template = "Letter about: {input}"
"#,
        )
        .unwrap();

        let stoic = catalog.get(PersonaKind::Stoic).unwrap();
        assert_eq!(stoic.name, "Seneca");
        assert!(stoic.markdown);
        assert_eq!(stoic.render_prompt("x"), "Letter about: x");
        assert_eq!(catalog.get(PersonaKind::Therapist).unwrap().name, "Therapist Agent");
        assert_eq!(catalog.personas().last().unwrap().kind, PersonaKind::Stoic);
    }

    #[test]
    fn test_toml_rejects_unknown_version() {
        let err = PersonaCatalog::from_toml_str("version = 2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_toml_rejects_template_without_placeholder() {
        let err = PersonaCatalog::from_toml_str(
            r#"
version = 1

[[persona]]
kind = "closure"
name = "Closure"
heading = "Closure"
instructions = "Help."
prompt_template = "No input here"
"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.context().iter().any(|(k, v)| *k == "persona" && v == "closure"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PersonaCatalog::load("/definitely/not/here/personas.toml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }
}
