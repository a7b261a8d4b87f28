#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // PPM 2x2
    let ppm = b"P6\n2 2\n255\n\xff\x00\x00\x00\xff\x00\x00\x00\xff\x80\x80\x80";
    fs::write(format!("{dir}/ppm_2x2.ppm"), ppm).unwrap();

    // PGM 3x2
    let pgm = b"P5\n3 2\n255\n\x00\x40\x80\xc0\xff\x64";
    fs::write(format!("{dir}/pgm_3x2.pgm"), pgm).unwrap();

    // PGM 16-bit 1x1, odd maxval
    let pgm16 = b"P5\n1 1\n1023\n\x03\xff";
    fs::write(format!("{dir}/pgm16_1x1.pgm"), pgm16).unwrap();

    // PAM RGBA 1x1
    let pam = b"P7\nWIDTH 1\nHEIGHT 1\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n\xff\x00\x00\xff";
    fs::write(format!("{dir}/pam_rgba_1x1.pam"), pam).unwrap();

    // PFM gray 1x1
    let mut pfm = b"Pf\n1 1\n-1.0\n".to_vec();
    pfm.extend_from_slice(&1.0f32.to_le_bytes());
    fs::write(format!("{dir}/pfm_gray_1x1.pfm"), pfm).unwrap();

    // Farbfeld 1x1
    let mut ff = b"farbfeld".to_vec();
    ff.extend_from_slice(&1u32.to_be_bytes());
    ff.extend_from_slice(&1u32.to_be_bytes());
    ff.extend_from_slice(&[0xff, 0xff, 0x00, 0x00, 0x80, 0x00, 0xff, 0xff]);
    fs::write(format!("{dir}/ff_1x1.ff"), ff).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/just_p6.bin"), b"P6").unwrap();
    fs::write(format!("{dir}/ff_short.bin"), b"farbfeld\x00\x00").unwrap();
    fs::write(format!("{dir}/p7_no_endhdr.bin"), b"P7\nWIDTH 1\nHEIGHT 1\n").unwrap();

    // Transform seeds: two size bytes followed by an image
    let dir = "fuzz/corpus/fuzz_transform";
    fs::create_dir_all(dir).unwrap();
    let mut seed = vec![3u8, 5];
    seed.extend_from_slice(ppm);
    fs::write(format!("{dir}/ppm_to_3x5.bin"), seed).unwrap();

    println!("Generated seed corpus in fuzz/corpus/");
}
