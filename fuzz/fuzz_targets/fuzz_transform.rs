#![no_main]
use libfuzzer_sys::fuzz_target;
use zensurface::{CodecRegistry, Filter, Image, Limits};

fuzz_target!(|data: &[u8]| {
    // First two bytes pick the target size, the rest is an encoded image
    let [w, h, rest @ ..] = data else {
        return;
    };
    let codecs = CodecRegistry::default();
    let limits = Limits {
        max_width: Some(512),
        max_height: Some(512),
        ..Default::default()
    };
    let mut image = Image::default();
    if image
        .load_with(rest, "", &codecs, Some(&limits), &enough::Unstoppable)
        .is_err()
    {
        return;
    }
    let original = image.data().to_vec();

    image.flip_around_x().expect("flip of a decoded image");
    image.flip_around_x().expect("flip of a decoded image");
    // Mirroring is limited to pixels of at most 4 bytes
    if image.pixel_size() <= 4 {
        image.flip_around_y().expect("flip of a decoded image");
        image.flip_around_y().expect("flip of a decoded image");
    }
    assert_eq!(image.data(), &original[..], "double flip changed pixels");

    let (w, h) = (u32::from(*w).max(1), u32::from(*h).max(1));
    for filter in [Filter::Nearest, Filter::Bilinear] {
        let mut scaled = image.to_owned_image();
        scaled.resize(w, h, filter).expect("resize of a decoded image");
        assert_eq!(scaled.data().len(), scaled.size());
    }
});
