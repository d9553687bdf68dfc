//! Geteilte Typen für layer-übergreifende Verträge.
//!
//! Optionen und Eingabe-Validierung, die von `osc`, `session` und `app`
//! gleichermaßen genutzt werden.

pub mod options;
pub mod validation;

pub use options::{AuthorityPolicy, StudioOptions};
pub use options::{PORT_MAX, PORT_MIN};
pub use validation::{parse_ipv4, parse_port, validate_port, ValidationError};
