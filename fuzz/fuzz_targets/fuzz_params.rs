#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use weetags_gate::{EngineOperation, Operation, ParameterRecord, RawParams};

#[derive(Debug, Arbitrary)]
struct QueryInput {
    path: Vec<(String, String)>,
    query: Vec<(String, Vec<String>)>,
}

fuzz_target!(|input: QueryInput| {
    let raw = RawParams::merge(input.path, None, input.query);
    let Ok(record) = ParameterRecord::from_raw(&raw) else {
        return;
    };

    for op in EngineOperation::ALL {
        let kwargs = record.get_kwargs(&op);
        for name in kwargs.names() {
            assert!(op.accepts().contains(&name));
        }
    }
});
