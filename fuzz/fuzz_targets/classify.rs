// cargo fuzz run classify corpus/classify -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;

use giflet::{classify, BufferSource};

fuzz_target!(|data: &[u8]| {
    let mut src = BufferSource::new(data);
    let _ = classify(&mut src);
});
