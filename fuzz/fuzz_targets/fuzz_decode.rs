#![no_main]
use libfuzzer_sys::fuzz_target;
use zensurface::{CodecRegistry, Image, Limits};

fuzz_target!(|data: &[u8]| {
    let codecs = CodecRegistry::default();
    let limits = Limits {
        max_memory_bytes: Some(64 * 1024 * 1024),
        ..Default::default()
    };

    // Sniffed decode must never panic
    let mut image = Image::default();
    let _ = image.load_with(data, "", &codecs, Some(&limits), &enough::Unstoppable);

    // Neither may each codec given the wrong input
    for hint in ["ff", "pnm"] {
        let mut image = Image::default();
        let _ = image.load_with(data, hint, &codecs, Some(&limits), &enough::Unstoppable);
    }
});
