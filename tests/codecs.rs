use zensurface::*;

fn image_from(data: &[u8], w: u32, h: u32, format: PixelFormat) -> Image<'static> {
    let mut image = Image::default();
    image.load_raw_data(data, w, h, 1, format, 1, 0).unwrap();
    image
}

fn roundtrip(image: &Image<'_>, ext: &str) -> Image<'static> {
    let codecs = CodecRegistry::default();
    let encoded = image.encode(ext, &codecs).unwrap();
    let mut decoded = Image::default();
    decoded.load(&encoded, "", &codecs).unwrap();
    decoded
}

#[test]
fn farbfeld_roundtrip_short_rgba() {
    let pixels: Vec<u8> = (0..2 * 2 * 8).map(|i| (i * 7) as u8).collect();
    let image = image_from(&pixels, 2, 2, PixelFormat::ShortRgba);
    let decoded = roundtrip(&image, "ff");
    assert_eq!(decoded.format(), PixelFormat::ShortRgba);
    assert_eq!((decoded.width(), decoded.height()), (2, 2));
    assert_eq!(decoded.data(), &pixels[..]);
}

#[test]
fn farbfeld_widens_8bit_sources() {
    let pixels = [255u8, 0, 51, 255, 0, 255, 0, 0];
    let image = image_from(&pixels, 2, 1, PixelFormat::R8G8B8A8);
    let decoded = roundtrip(&image, "farbfeld");
    assert_eq!(decoded.format(), PixelFormat::ShortRgba);
    for x in 0..2 {
        assert_eq!(
            decoded.colour_at(x, 0, 0).unwrap(),
            image.colour_at(x, 0, 0).unwrap()
        );
    }
}

#[test]
fn pnm_roundtrips_native_formats() {
    let cases: [(PixelFormat, &str); 6] = [
        (PixelFormat::L8, "pgm"),
        (PixelFormat::L16, "pgm"),
        (PixelFormat::R8G8B8, "ppm"),
        (PixelFormat::ShortRgb, "ppm"),
        (PixelFormat::R8G8B8A8, "pam"),
        (PixelFormat::ByteLa, "pam"),
    ];
    for (format, ext) in cases {
        let len = 3 * 2 * format.element_size();
        let pixels: Vec<u8> = (0..len).map(|i| (i * 13 + 1) as u8).collect();
        let image = image_from(&pixels, 3, 2, format);
        let decoded = roundtrip(&image, ext);
        assert_eq!(decoded.format(), format, "{ext}");
        assert_eq!(decoded.data(), &pixels[..], "{format:?}");
    }
}

#[test]
fn pfm_roundtrip_preserves_floats() {
    let mut image = Image::new(PixelFormat::Float32Rgb, 2, 3, 1).unwrap();
    for y in 0..3 {
        for x in 0..2 {
            let v = (x + y * 2) as f32 * 0.25;
            image
                .set_colour_at(Colour::new(v, -v, v * 4.0, 1.0), x, y, 0)
                .unwrap();
        }
    }
    let decoded = roundtrip(&image, "pfm");
    assert_eq!(decoded.format(), PixelFormat::Float32Rgb);
    assert_eq!(decoded.data(), image.data());
}

#[test]
fn bgr_encodes_as_rgb() {
    let image = image_from(&[1, 2, 3, 4, 5, 6], 2, 1, PixelFormat::B8G8R8);
    let decoded = roundtrip(&image, "ppm");
    assert_eq!(decoded.format(), PixelFormat::R8G8B8);
    assert_eq!(decoded.data(), &[3, 2, 1, 6, 5, 4]);
}

#[test]
fn extension_hint_picks_codec() {
    let codecs = CodecRegistry::default();
    let image = image_from(&[10, 20, 30, 40], 2, 2, PixelFormat::L8);
    let encoded = image.encode("PGM", &codecs).unwrap();
    assert!(encoded.starts_with(b"P5\n"));

    let mut decoded = Image::default();
    decoded.load(&encoded, "pnm", &codecs).unwrap();
    assert_eq!(decoded.data(), &[10, 20, 30, 40]);
}

#[test]
fn magic_identifies_codec() {
    let codecs = CodecRegistry::default();
    let ff = image_from(&[0u8; 8], 1, 1, PixelFormat::ShortRgba)
        .encode("ff", &codecs)
        .unwrap();
    assert_eq!(Image::file_ext_from_magic(&ff, &codecs), Some("ff"));
    assert_eq!(Image::file_ext_from_magic(b"P6\n1 1\n255\n\0\0\0", &codecs), Some("pnm"));
    assert_eq!(Image::file_ext_from_magic(b"\x89PNG\r\n\x1a\n", &codecs), None);
    assert_eq!(Image::file_ext_from_magic(b"", &codecs), None);
}

#[test]
fn unrecognized_input_fails_closed() {
    let codecs = CodecRegistry::default();
    let mut image = Image::default();
    assert!(matches!(
        image.load(b"GIF89a......", "", &codecs),
        Err(ImageError::UnrecognizedFormat)
    ));
    assert!(matches!(
        image.load(b"farbfeld", "png", &codecs),
        Err(ImageError::UnrecognizedFormat)
    ));
    assert!(matches!(
        image.load(b"farbfeld", "", &CodecRegistry::new()),
        Err(ImageError::UnrecognizedFormat)
    ));
    assert!(image.is_empty());
}

#[test]
fn failed_load_leaves_image_unchanged() {
    let codecs = CodecRegistry::default();
    let mut image = image_from(&[1, 2, 3, 4], 2, 2, PixelFormat::L8);
    let err = image.load(b"farbfeld\0\0\0\x02", "", &codecs).unwrap_err();
    assert!(matches!(err, ImageError::UnexpectedEof | ImageError::InvalidHeader(_)));
    assert_eq!(image.format(), PixelFormat::L8);
    assert_eq!(image.data(), &[1, 2, 3, 4]);
}

#[test]
fn encode_errors() {
    let codecs = CodecRegistry::default();
    assert!(matches!(
        Image::default().encode("ff", &codecs),
        Err(ImageError::Internal(_))
    ));

    let image = image_from(&[0u8; 4], 2, 2, PixelFormat::L8);
    assert!(matches!(
        image.encode("", &codecs),
        Err(ImageError::InvalidParameters(_))
    ));
    assert!(matches!(
        image.encode("png", &codecs),
        Err(ImageError::InvalidParameters(_))
    ));

    let alpha_only = image_from(&[0u8; 4], 2, 2, PixelFormat::A8);
    assert!(matches!(
        alpha_only.encode("ppm", &codecs),
        Err(ImageError::Unsupported(_))
    ));
    assert!(matches!(
        alpha_only.encode("ff", &codecs),
        Err(ImageError::Unsupported(_))
    ));
}

#[test]
fn cubemaps_and_volumes_are_not_encodable() {
    let codecs = CodecRegistry::default();
    let mut cube = Image::default();
    cube.load_raw_data(&[0u8; 6], 1, 1, 1, PixelFormat::L8, 6, 0)
        .unwrap();
    assert!(matches!(
        cube.encode("pgm", &codecs),
        Err(ImageError::Unsupported(_))
    ));

    let volume = Image::new(PixelFormat::L8, 2, 2, 2).unwrap();
    assert!(matches!(
        volume.encode("pgm", &codecs),
        Err(ImageError::Unsupported(_))
    ));
}

#[test]
fn only_base_level_is_encoded() {
    let codecs = CodecRegistry::default();
    let mut image = Image::default();
    image
        .load_raw_data(&[1, 2, 3, 4, 9], 2, 2, 1, PixelFormat::L8, 1, 1)
        .unwrap();
    let encoded = image.encode("pgm", &codecs).unwrap();
    assert!(encoded.ends_with(&[1, 2, 3, 4]));
}

#[test]
fn limits_apply_to_decode() {
    let codecs = CodecRegistry::default();
    let encoded = Image::new(PixelFormat::R8G8B8, 8, 8, 1)
        .unwrap()
        .encode("ppm", &codecs)
        .unwrap();

    let limits = Limits {
        max_width: Some(4),
        ..Default::default()
    };
    let mut image = Image::default();
    let err = image
        .load_with(&encoded, "", &codecs, Some(&limits), &Unstoppable)
        .unwrap_err();
    assert!(matches!(err, ImageError::LimitExceeded(_)));

    let limits = Limits {
        max_memory_bytes: Some(100),
        ..Default::default()
    };
    let err = image
        .load_with(&encoded, "", &codecs, Some(&limits), &Unstoppable)
        .unwrap_err();
    assert!(matches!(err, ImageError::LimitExceeded(_)));
    assert!(image.is_empty());
}

#[test]
fn two_encoded_images_combine() {
    let codecs = CodecRegistry::default();
    let rgb = image_from(&[255u8, 0, 0].repeat(4), 2, 2, PixelFormat::R8G8B8)
        .encode("ppm", &codecs)
        .unwrap();
    let mask = image_from(&[128u8; 4], 2, 2, PixelFormat::L8)
        .encode("pgm", &codecs)
        .unwrap();

    let mut image = Image::default();
    image
        .load_two_images_as_rgba(&rgb, &mask, PixelFormat::R8G8B8A8, "ppm", "", &codecs)
        .unwrap();
    assert_eq!(image.data(), &[255u8, 0, 0, 128].repeat(4)[..]);
}

#[test]
fn registered_codecs_override_defaults() {
    struct Fake;
    impl Codec for Fake {
        fn type_name(&self) -> &'static str {
            "fake"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["ff"]
        }
        fn magic_matches(&self, _magic: &[u8]) -> bool {
            false
        }
        fn decode(
            &self,
            _data: &[u8],
            _limits: Option<&Limits>,
            _stop: &dyn Stop,
        ) -> Result<DecodedImage, ImageError> {
            Err(ImageError::Unsupported("fake".into()))
        }
        fn encode(
            &self,
            _meta: &ImageData,
            _pixels: &[u8],
            _stop: &dyn Stop,
        ) -> Result<Vec<u8>, ImageError> {
            Ok(b"fake".to_vec())
        }
    }

    let mut codecs = CodecRegistry::default();
    codecs.register(Box::new(Fake));
    let image = image_from(&[0u8; 8], 1, 1, PixelFormat::ShortRgba);
    assert_eq!(image.encode("ff", &codecs).unwrap(), b"fake");
    assert_eq!(codecs.by_extension("farbfeld").unwrap().type_name(), "ff");
}

#[cfg(feature = "std")]
mod io {
    use super::*;
    use std::io::Cursor;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("zensurface-{}-{name}", std::process::id()))
    }

    #[test]
    fn save_and_load_file() {
        let codecs = CodecRegistry::default();
        let image = image_from(&[5, 6, 7, 8, 9, 10], 2, 1, PixelFormat::R8G8B8);
        let path = scratch_path("save.ppm");
        image.save(&path, &codecs).unwrap();

        let mut loaded = Image::default();
        loaded.load_file(&path, &codecs).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.data(), image.data());
    }

    #[test]
    fn save_needs_an_extension() {
        let codecs = CodecRegistry::default();
        let image = image_from(&[0u8; 4], 2, 2, PixelFormat::L8);
        let err = image.save(scratch_path("noext"), &codecs).unwrap_err();
        assert!(matches!(err, ImageError::InvalidParameters(_)));
    }

    #[test]
    fn reader_is_sniffed_and_rewound() {
        let codecs = CodecRegistry::default();
        let encoded = image_from(&[1, 2, 3, 4], 2, 2, PixelFormat::L8)
            .encode("pgm", &codecs)
            .unwrap();
        let mut reader = Cursor::new(encoded);
        let mut image = Image::default();
        image.load_reader(&mut reader, "", &codecs).unwrap();
        assert_eq!(image.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn raw_reader_size_must_match() {
        let mut image = Image::default();
        let mut short = Cursor::new(vec![0u8; 15]);
        let err = image
            .load_raw_reader(&mut short, 4, 4, 1, PixelFormat::L8, 1, 0)
            .unwrap_err();
        assert!(matches!(err, ImageError::InvalidParameters(_)));
        assert!(image.is_empty());

        let mut exact = Cursor::new((0..21u8).collect::<Vec<_>>());
        image
            .load_raw_reader(&mut exact, 4, 4, 1, PixelFormat::L8, 1, 2)
            .unwrap();
        assert_eq!(image.num_mipmaps(), 2);
        assert_eq!(image.pixel_box(0, 2).unwrap().data(), &[20]);
    }
}
