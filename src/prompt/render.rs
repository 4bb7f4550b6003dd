//! Template substitution.
//!
//! Two deliberately distinct substitution paths exist:
//!
//! - [`Prompt::render`] is the strict, parameter-aware path: only declared
//!   parameters are substitutable, and a required parameter with no default
//!   and no supplied value is an error.
//! - [`render_raw`] is the permissive key/value path used by the test
//!   harness when constructing outbound request text: every supplied key is
//!   substituted, whether declared or not.
//!
//! Do not unify them. The harness intentionally tolerates ad-hoc inputs
//! that do not match the declared schema, and a user supplying undeclared
//! keys will see them substituted by the harness but ignored by strict
//! rendering.
//!
//! Replacement is literal-substring based: no escaping, no nested
//! expressions, no conditionals. Substitution is not idempotent when a
//! supplied value or default itself contains `{other_param}` text; later
//! iterations may substitute inside previously inserted text. This is a
//! known limitation, kept to preserve observable behavior for existing
//! content.

use std::collections::BTreeMap;

use crate::error::RenderError;
use crate::prompt::schema::Prompt;

impl Prompt {
    /// Renders the template with the supplied substitutions.
    ///
    /// Walks declared parameters in declaration order. For each parameter:
    /// a supplied value replaces every `{name}` occurrence; a required
    /// parameter with no default and no supplied value fails with
    /// [`RenderError::MissingParameter`] without partial output; a default
    /// fills in when present; an optional parameter with neither leaves its
    /// placeholder untouched. Placeholders that do not correspond to any
    /// declared parameter remain verbatim.
    pub fn render(&self, substitutions: &BTreeMap<String, String>) -> Result<String, RenderError> {
        let mut text = self.template.clone();
        for param in &self.parameters {
            let placeholder = format!("{{{}}}", param.name);
            if let Some(value) = substitutions.get(&param.name) {
                text = text.replace(&placeholder, value);
            } else if param.required && param.default.is_none() {
                return Err(RenderError::MissingParameter(param.name.clone()));
            } else if let Some(default) = &param.default {
                text = text.replace(&placeholder, default);
            }
        }
        Ok(text)
    }
}

/// Replaces `{key}` with its value for every supplied key, ignoring the
/// declared parameter list entirely.
///
/// Infallible by construction; unknown keys are simply inert and unmatched
/// placeholders stay in the output.
pub fn render_raw(template: &str, inputs: &BTreeMap<String, String>) -> String {
    let mut text = template.to_string();
    for (key, value) in inputs {
        text = text.replace(&format!("{{{}}}", key), value);
    }
    text
}
