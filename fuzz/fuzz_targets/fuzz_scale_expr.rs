#![no_main]

use libfuzzer_sys::fuzz_target;
use trajectory_osc_studio::osc::{AddressTemplate, AxisSource, ScaleExpr};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(expr) = ScaleExpr::parse(text) {
        let again = ScaleExpr::parse(&expr.to_string()).expect("Display muss wieder parsebar sein");
        assert_eq!(again.apply(1.0), expr.apply(1.0));
    }

    if let Ok(address) = AddressTemplate::parse(text) {
        assert!(address.render(42).starts_with('/'));
    }

    let _ = AxisSource::parse(text);
});
