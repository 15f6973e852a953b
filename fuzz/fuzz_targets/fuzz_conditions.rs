#![no_main]
use libfuzzer_sys::fuzz_target;
use weetags_gate::ConditionCompiler;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Anything accepted must survive its own canonical form
    if let Ok(expr) = ConditionCompiler::parse_str(text) {
        let again = ConditionCompiler::parse(&expr.to_value())
            .expect("canonical conditions must reparse");
        assert_eq!(expr, again);
    }
});
