// cargo fuzz run decode corpus/decode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;

use giflet::{decode_frame, parse, BufferSource};

fuzz_target!(|data: &[u8]| {
    let mut src = BufferSource::new(data);
    if let Ok(doc) = parse(&mut src) {
        for i in 0..doc.frame_count() {
            let _ = decode_frame(&mut src, &doc, i);
        }
    }
});
