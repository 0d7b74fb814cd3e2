//! Media transcoder vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chatrelay_core::media::{self, MediaTag};

mod vector_loader;
use vector_loader::{load_str, MediaVector};

fn tag_of(prefix: &str) -> MediaTag {
    MediaTag::ALL
        .into_iter()
        .find(|t| t.prefix() == prefix)
        .unwrap()
}

#[test]
fn media_vectors() {
    let vectors: Vec<MediaVector> = serde_json::from_str(&load_str("media_vectors.json")).unwrap();

    for v in vectors {
        let tag = tag_of(&v.tag);
        let raw = v.frame.decode();

        let encoded = media::encode(tag, &raw);
        assert!(encoded.starts_with(tag.prefix()), "vector={}", v.description);
        assert_eq!(MediaTag::detect(&encoded), Some(tag), "vector={}", v.description);
        if let Some(expect) = &v.expect_value {
            assert_eq!(&encoded, expect, "vector={}", v.description);
        }

        let decoded = media::decode(&encoded, tag).unwrap();
        assert_eq!(decoded.as_ref(), raw.as_slice(), "vector={}", v.description);

        if let Some(ext) = &v.expect_ext {
            assert_eq!(
                media::suggested_extension(tag, &raw),
                ext.as_str(),
                "vector={}",
                v.description
            );
        }
    }
}

#[test]
fn three_byte_image_round_trip() {
    let encoded = media::encode(MediaTag::Image, &[0x01, 0x02, 0x03]);
    assert_eq!(encoded, "IMG:AQID");
    let raw = media::decode(&encoded, MediaTag::Image).unwrap();
    assert_eq!(raw.as_ref(), &[0x01, 0x02, 0x03]);
}

#[test]
fn decode_tolerates_missing_tag() {
    let raw = media::decode("AQID", MediaTag::Audio).unwrap();
    assert_eq!(raw.as_ref(), &[0x01, 0x02, 0x03]);
}

#[test]
fn invalid_base64_is_decode_error() {
    let err = media::decode("VIDEO:not*base64!", MediaTag::Video).expect_err("must fail");
    assert_eq!(err.code().as_str(), "DECODE_ERROR");
}

#[test]
fn extension_mapping() {
    assert_eq!(MediaTag::from_extension(".PNG"), Some(MediaTag::Image));
    assert_eq!(MediaTag::from_extension("m4a"), Some(MediaTag::Audio));
    assert_eq!(MediaTag::from_extension("mkv"), Some(MediaTag::Video));
    assert_eq!(MediaTag::from_extension("txt"), None);
}

#[test]
fn detect_ignores_plain_text() {
    assert_eq!(MediaTag::detect("hello IMG:"), None);
    assert_eq!(MediaTag::detect("AUDIO:AA=="), Some(MediaTag::Audio));
}
