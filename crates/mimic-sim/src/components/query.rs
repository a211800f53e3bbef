use mimic_core::Persona;
use tracing::debug;

/// Phrases stripped from an intent before it is used as a query.
const INTENT_FILLERS: &[&str] = &["i want to", "i need to", "looking for", "find", "search for"];

/// Produces search queries for a persona.
pub trait QueryGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// The next query, or `None` when nothing sensible can be searched.
    fn generate(&mut self, persona: &Persona) -> Option<String>;
}

/// Uses the persona's intent, lower-cased and stripped of filler phrases.
#[derive(Debug, Clone, Default)]
pub struct IntentQueryGenerator;

impl IntentQueryGenerator {
    pub fn query_for(intent: &str) -> Option<String> {
        let mut query = intent.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        for filler in INTENT_FILLERS {
            query = query.replace(filler, "").trim().to_string();
        }
        let query = query.split_whitespace().collect::<Vec<_>>().join(" ");
        (!query.is_empty()).then_some(query)
    }
}

impl QueryGenerator for IntentQueryGenerator {
    fn name(&self) -> &str {
        "intent"
    }

    fn generate(&mut self, persona: &Persona) -> Option<String> {
        let query = Self::query_for(&persona.intent);
        debug!(?query, "intent query");
        query
    }
}

/// Cycles through common rewrites of a base query, then repeats the base.
pub struct VariationQueryGenerator {
    base: Box<dyn QueryGenerator>,
    issued: usize,
}

impl VariationQueryGenerator {
    pub fn new(base: Box<dyn QueryGenerator>) -> Self {
        Self { base, issued: 0 }
    }

    fn variation(base: &str, index: usize) -> String {
        match index {
            1 => format!("{base} reviews"),
            2 => format!("best {base}"),
            3 => format!("{base} buy online"),
            4 => format!("cheap {base}"),
            _ => base.to_string(),
        }
    }
}

impl QueryGenerator for VariationQueryGenerator {
    fn name(&self) -> &str {
        "variation"
    }

    fn generate(&mut self, persona: &Persona) -> Option<String> {
        let base = self.base.generate(persona)?;
        let query = Self::variation(&base, self.issued);
        self.issued += 1;
        debug!(%query, "variation query");
        Some(query)
    }
}
