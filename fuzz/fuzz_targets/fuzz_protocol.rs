#![no_main]

use libfuzzer_sys::fuzz_target;
use trajectory_osc_studio::{ClientMessage, ServerMessage};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(message) = ClientMessage::from_json(text) {
        let json = message.to_json().expect("Serialisierung darf nicht fehlschlagen");
        let _ = ClientMessage::from_json(&json);
    }
    let _ = ServerMessage::from_json(text);
});
