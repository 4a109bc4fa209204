// Copyright 2024 The chess-zero Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The replay wire format (§6): one record per line, three whitespace
//! separated base64 blobs `IMAGE VALUE POLICY`, mirroring
//! `training.cpp`'s `istringstream >> encoded_image >> encoded_value >>
//! encoded_policy` line shape -- base64 rather than the teacher's base85,
//! per the design's stated wire format.

use base64::{engine::general_purpose::STANDARD, Engine};
use cz_utils::error::CodecError;

/// A flat `f32` tensor, shape-prefixed so the decoder can validate the
/// element count before handing the buffer back.
#[derive(Clone, Debug, PartialEq)]
pub struct WireTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl WireTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        WireTensor { shape, data }
    }
}

/// Encodes a tensor as `rank shape... data...` little-endian `u32`/`f32`
/// words, base64'd.
pub fn encode_tensor(tensor: &WireTensor) -> String {
    let mut bytes = Vec::with_capacity(4 + tensor.shape.len() * 4 + tensor.data.len() * 4);
    bytes.extend_from_slice(&(tensor.shape.len() as u32).to_le_bytes());
    for &dim in &tensor.shape {
        bytes.extend_from_slice(&(dim as u32).to_le_bytes());
    }
    for &value in &tensor.data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    STANDARD.encode(bytes)
}

/// The inverse of `encode_tensor`.
pub fn decode_tensor(encoded: &str) -> Result<WireTensor, CodecError> {
    let bytes = STANDARD.decode(encoded)?;
    if bytes.len() < 4 {
        return Err(CodecError::MalformedLine("tensor header truncated".to_string()));
    }

    let rank = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let header_len = 4 + rank * 4;
    if bytes.len() < header_len {
        return Err(CodecError::MalformedLine("tensor shape truncated".to_string()));
    }

    let mut shape = Vec::with_capacity(rank);
    for i in 0..rank {
        let start = 4 + i * 4;
        shape.push(u32::from_le_bytes(bytes[start..start + 4].try_into().unwrap()) as usize);
    }

    let expected_elements: usize = shape.iter().product();
    let remaining = &bytes[header_len..];
    if remaining.len() != expected_elements * 4 {
        return Err(CodecError::ShapeMismatch {
            expected: expected_elements,
            actual: remaining.len() / 4,
        });
    }

    let data = remaining
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect();

    Ok(WireTensor { shape, data })
}

/// A decoded replay record: the position image, the final game outcome
/// from the mover's perspective, and the visit-count policy target.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayRecord {
    pub image: WireTensor,
    pub value: f32,
    pub policy: WireTensor,
}

/// Encodes one replay line: `base64(image) base64(value) base64(policy)`.
pub fn encode_record(record: &ReplayRecord) -> String {
    let value_tensor = WireTensor::new(vec![1], vec![record.value]);
    format!(
        "{} {} {}",
        encode_tensor(&record.image),
        encode_tensor(&value_tensor),
        encode_tensor(&record.policy)
    )
}

/// Decodes one replay line. Malformed lines are reported, never panicked
/// on -- the caller logs and skips per §7's codec-error policy.
pub fn decode_record(line: &str) -> Result<ReplayRecord, CodecError> {
    let mut fields = line.split_whitespace();
    let image_field = fields.next().ok_or_else(|| CodecError::MalformedLine(line.to_string()))?;
    let value_field = fields.next().ok_or_else(|| CodecError::MalformedLine(line.to_string()))?;
    let policy_field = fields.next().ok_or_else(|| CodecError::MalformedLine(line.to_string()))?;
    if fields.next().is_some() {
        return Err(CodecError::MalformedLine(line.to_string()));
    }

    let image = decode_tensor(image_field)?;
    let value_tensor = decode_tensor(value_field)?;
    let policy = decode_tensor(policy_field)?;

    let value = *value_tensor
        .data
        .first()
        .ok_or_else(|| CodecError::MalformedLine(line.to_string()))?;

    Ok(ReplayRecord { image, value, policy })
}
