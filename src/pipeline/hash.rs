//! Content hashing of rendered pages.
//!
//! Pixels are visited row by row, top-left first. Each pixel contributes the
//! decimal text of its four 16-bit alpha-premultiplied channels (`r`, `g`,
//! `b`, `a`, no separators) to a streaming SHA-256. The digest is returned as
//! lowercase hex.
//!
//! Premultiplying means fully transparent pixels hash the same regardless of
//! their colour channels, and 8-bit sources are widened with `v * 0x101` so
//! an 8-bit and a 16-bit copy of the same picture agree.

use crate::output::ContentHash;
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

const CHANNEL_MAX: u32 = 0xffff;

/// Deterministic fingerprint of `img`'s pixels.
pub fn hash_image(img: &DynamicImage) -> ContentHash {
    let mut hasher = Sha256::new();
    let mut buf = String::with_capacity(24);

    match img {
        DynamicImage::ImageRgba8(rgba) => {
            for px in rgba.pixels() {
                let [r, g, b, a] = px.0.map(|c| u32::from(c) * 0x101);
                feed(&mut hasher, &mut buf, r, g, b, a);
            }
        }
        other => {
            for px in other.to_rgba16().pixels() {
                let [r, g, b, a] = px.0.map(u32::from);
                feed(&mut hasher, &mut buf, r, g, b, a);
            }
        }
    }

    ContentHash::new(format!("{:x}", hasher.finalize()))
}

fn feed(hasher: &mut Sha256, buf: &mut String, r: u32, g: u32, b: u32, a: u32) {
    let pm = |c: u32| c * a / CHANNEL_MAX;
    buf.clear();
    // Writing into a String cannot fail.
    let _ = write!(buf, "{}{}{}{}", pm(r), pm(g), pm(b), a);
    hasher.update(buf.as_bytes());
}
