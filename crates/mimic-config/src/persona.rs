use mimic_core::{MimicError, Persona, Result};
use std::path::Path;
use tracing::info;

/// Load a persona from a JSON file.
///
/// Accepts the flat form (`name`, `background`, `intent`, demographics) and
/// the legacy form with a free-text `persona` field.
pub fn load_persona(path: &Path) -> Result<Persona> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        MimicError::Config(format!("failed to read persona {}: {e}", path.display()))
    })?;
    let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
        MimicError::Config(format!("failed to parse persona {}: {e}", path.display()))
    })?;
    let persona = Persona::from_value(value)?;
    if persona.intent.trim().is_empty() {
        return Err(MimicError::ConfigValidation {
            field: "intent".into(),
            reason: format!("persona in {} has no intent", path.display()),
        });
    }
    info!(name = %persona.name, path = %path.display(), "persona loaded");
    Ok(persona)
}
