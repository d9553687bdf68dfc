//! Eingabe-Validierung an der Grenze (UI, Relay-Protokoll, Konfigurationsdateien).
//!
//! Ungültige Werte werden abgelehnt, nie stillschweigend korrigiert.

use super::options::{PORT_MAX, PORT_MIN};
use std::net::Ipv4Addr;

/// Abgelehnte Eingabe; wird nur an die auslösende Aktion zurückgemeldet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Port '{0}' ist keine ganze Zahl")]
    PortNotInteger(String),
    #[error("Port {0} liegt außerhalb von [{min}, {max}]", min = PORT_MIN, max = PORT_MAX)]
    PortOutOfRange(i64),
    #[error("'{0}' ist keine gültige IPv4-Adresse (a.b.c.d)")]
    InvalidIpv4(String),
    #[error("OSC-Adresse '{address}' ungültig: {reason}")]
    InvalidOscAddress { address: String, reason: &'static str },
    #[error("Skalierungs-Ausdruck '{0}' ungültig (erwartet z.B. '*2' oder '/ -1.5')")]
    InvalidScaleExpression(String),
    #[error("Division durch 0 im Skalierungs-Ausdruck '{0}'")]
    DivisionByZero(String),
    #[error("Achsen-Quelle '{0}' ungültig (erwartet allX/allY/allZ oder Objekt-Index)")]
    InvalidAxisSource(String),
    #[error("Route {0} existiert nicht")]
    UnknownRoute(usize),
}

/// Prüft einen bereits numerischen Port auf den gültigen Bereich.
pub fn validate_port(port: i64) -> Result<u16, ValidationError> {
    if (i64::from(PORT_MIN)..=i64::from(PORT_MAX)).contains(&port) {
        // Bereich liegt vollständig in u16
        Ok(port as u16)
    } else {
        Err(ValidationError::PortOutOfRange(port))
    }
}

/// Parst einen Port aus Texteingabe (nur Ganzzahlen, keine Rundung).
pub fn parse_port(input: &str) -> Result<u16, ValidationError> {
    let trimmed = input.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::PortNotInteger(trimmed.to_string()))?;
    validate_port(value)
}

/// Parst eine IPv4-Adresse in Dotted-Quad-Notation.
pub fn parse_ipv4(input: &str) -> Result<Ipv4Addr, ValidationError> {
    let trimmed = input.trim();
    trimmed
        .parse::<Ipv4Addr>()
        .map_err(|_| ValidationError::InvalidIpv4(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_range_bounds() {
        assert_eq!(parse_port("1024"), Ok(1024));
        assert_eq!(parse_port(" 49151 "), Ok(49151));
        assert_eq!(parse_port("1023"), Err(ValidationError::PortOutOfRange(1023)));
        assert_eq!(
            parse_port("49152"),
            Err(ValidationError::PortOutOfRange(49152))
        );
        assert_eq!(parse_port("-5"), Err(ValidationError::PortOutOfRange(-5)));
    }

    #[test]
    fn test_port_not_coerced() {
        assert_eq!(
            parse_port("7400.5"),
            Err(ValidationError::PortNotInteger("7400.5".to_string()))
        );
        assert!(matches!(
            parse_port("abc"),
            Err(ValidationError::PortNotInteger(_))
        ));
    }

    #[test]
    fn test_ipv4_dotted_quad() {
        assert_eq!(parse_ipv4("10.0.0.1"), Ok(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(parse_ipv4("10.0.0").is_err());
        assert!(parse_ipv4("256.0.0.1").is_err());
        assert!(parse_ipv4("localhost").is_err());
    }
}
