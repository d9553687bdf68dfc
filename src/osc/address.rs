//! OSC-Adress-Templates mit Source-ID-Platzhalter.

use crate::shared::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platzhalter für die Source-ID (Objekt-Index + Offset).
pub const ID_PLACEHOLDER: &str = "{id}";

/// Standard-Template neuer Routen.
pub const DEFAULT_ADDRESS: &str = "/source/{id}/xyz";

/// Geprüftes Adress-Template, z.B. `/source/{id}/xyz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressTemplate {
    template: String,
}

impl AddressTemplate {
    /// Prüft ein Template. Nach Ersetzen des Platzhalters muss eine gültige
    /// OSC-Adresse entstehen (beginnt mit `/`, druckbares ASCII ohne
    /// Leerzeichen, `#` und `,`, keine leeren Segmente).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let template = input.trim();
        let invalid = |reason: &'static str| ValidationError::InvalidOscAddress {
            address: template.to_string(),
            reason,
        };

        let rendered = template.replace(ID_PLACEHOLDER, "1");
        if !rendered.starts_with('/') {
            return Err(invalid("muss mit '/' beginnen"));
        }
        if rendered.len() > 1 && rendered.ends_with('/') {
            return Err(invalid("darf nicht mit '/' enden"));
        }
        if rendered.contains("//") {
            return Err(invalid("leeres Adress-Segment"));
        }
        if let Some(c) = rendered
            .chars()
            .find(|c| !c.is_ascii_graphic() || matches!(c, '#' | ',' | '{' | '}'))
        {
            return Err(if c == '{' || c == '}' {
                invalid("unbekannter Platzhalter")
            } else {
                invalid("unzulässiges Zeichen")
            });
        }

        Ok(Self {
            template: template.to_string(),
        })
    }

    /// Setzt die Source-ID ein.
    pub fn render(&self, id: usize) -> String {
        self.template.replace(ID_PLACEHOLDER, &id.to_string())
    }

    pub fn has_placeholder(&self) -> bool {
        self.template.contains(ID_PLACEHOLDER)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl Default for AddressTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_ADDRESS.to_string(),
        }
    }
}

impl fmt::Display for AddressTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl TryFrom<String> for AddressTemplate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AddressTemplate> for String {
    fn from(address: AddressTemplate) -> Self {
        address.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_every_placeholder() {
        let address = AddressTemplate::parse("/track/{id}/pos/{id}").expect("Template");
        assert_eq!(address.render(3), "/track/3/pos/3");
        assert!(address.has_placeholder());
    }

    #[test]
    fn test_static_address_allowed() {
        let address = AddressTemplate::parse("/master/xyz").expect("Template");
        assert_eq!(address.render(9), "/master/xyz");
        assert!(!address.has_placeholder());
    }

    #[test]
    fn test_invalid_addresses_rejected() {
        for input in ["source/{id}", "/a b", "/a//b", "/a/", "/a#b", "/x/{idx}", "/ü"] {
            assert!(
                matches!(
                    AddressTemplate::parse(input),
                    Err(ValidationError::InvalidOscAddress { .. })
                ),
                "'{}' hätte abgelehnt werden müssen",
                input
            );
        }
    }

    #[test]
    fn test_default_template_is_valid() {
        let default = AddressTemplate::default();
        assert_eq!(AddressTemplate::parse(default.as_str()), Ok(default));
    }
}
