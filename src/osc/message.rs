//! Ausgehende OSC-Nachricht und ihre Kodierung.

use rosc::{OscMessage, OscPacket, OscType};
use serde::{Deserialize, Serialize};

/// Adresse plus float32-Argumente der definierten Achsen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscOutgoing {
    pub address: String,
    pub args: Vec<f32>,
}

impl OscOutgoing {
    pub fn new(address: impl Into<String>, args: Vec<f32>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    pub fn to_packet(&self) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: self.address.clone(),
            args: self.args.iter().copied().map(OscType::Float).collect(),
        })
    }

    /// Kodiert die Nachricht als OSC-1.0-Paket.
    pub fn encode(&self) -> Result<Vec<u8>, rosc::OscError> {
        rosc::encoder::encode(&self.to_packet())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decodes_with_float_args() {
        let message = OscOutgoing::new("/source/1/xyz", vec![1.0, -2.5]);
        let bytes = message.encode().expect("Kodierung");
        // Adresse, Typ-Tags und Argumente sind 4-Byte-aligned
        assert_eq!(bytes.len() % 4, 0);

        let (_, packet) = rosc::decoder::decode_udp(&bytes).expect("Dekodierung");
        let OscPacket::Message(decoded) = packet else {
            panic!("Bundle statt Nachricht");
        };
        assert_eq!(decoded.addr, "/source/1/xyz");
        assert_eq!(decoded.args, vec![OscType::Float(1.0), OscType::Float(-2.5)]);
    }
}
