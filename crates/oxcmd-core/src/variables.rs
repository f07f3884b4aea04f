//! Session variables and `${name}` interpolation.

use std::collections::HashMap;

use crate::error::CommandError;

/// Variables written by `store*` commands.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable. The name is trimmed.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.trim().to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces every `${name}` in `raw` with the variable's value.
    ///
    /// A reference to an unset variable is [`CommandError::VariableUndefined`].
    pub fn interpolate(&self, raw: &str) -> Result<String, CommandError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start + 2..].find('}') else {
                break;
            };
            let name = &rest[start + 2..start + 2 + len];
            let value = self
                .get(name)
                .ok_or_else(|| CommandError::VariableUndefined(name.trim().to_string()))?;
            out.push_str(&rest[..start]);
            out.push_str(value);
            rest = &rest[start + 2 + len + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}
