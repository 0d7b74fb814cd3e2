//! JSON test vector loader shared by envelope and media tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use base64::Engine;
use serde::Deserialize;

pub fn load_str(name: &str) -> String {
    fs::read_to_string(format!("tests/vectors/{name}")).unwrap()
}

#[derive(Debug, Deserialize)]
pub struct MediaVector {
    pub description: String,
    pub tag: String,
    pub frame: FrameData,
    #[serde(default)]
    pub expect_value: Option<String>,
    #[serde(default)]
    pub expect_ext: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FrameData {
    pub encoding: String,
    pub data: String,
}

impl FrameData {
    pub fn decode(&self) -> Vec<u8> {
        match self.encoding.as_str() {
            "base64" => base64::engine::general_purpose::STANDARD
                .decode(&self.data)
                .expect("invalid base64 in test vector"),
            "hex" => hex::decode(&self.data).expect("invalid hex in test vector"),
            other => panic!("unsupported encoding: {other}"),
        }
    }
}
