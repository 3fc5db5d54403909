// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX embedding backend for local inference using all-MiniLM-L6-v2.
//!
//! Catalog texts and queries are embedded on CPU; no external API calls.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use usher_core::{Embedder, UsherError};

/// Embedding dimensions for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

fn search_err(context: &str, e: impl std::fmt::Display) -> UsherError {
    UsherError::Search(format!("{context}: {e}"))
}

/// One tokenized input in the `[1, seq_len]` shape the model expects.
struct TokenBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
    mask: Vec<i64>,
}

impl TokenBatch {
    fn from_encoding(encoding: &tokenizers::Encoding) -> Result<Self, UsherError> {
        let widen = |ids: &[u32]| ids.iter().map(|&v| i64::from(v)).collect::<Vec<i64>>();
        let mask = widen(encoding.get_attention_mask());
        let seq_len = mask.len();
        let row = |name: &str, data: Vec<i64>| {
            Array2::from_shape_vec((1, seq_len), data)
                .map_err(|e| search_err(&format!("bad {name} shape"), e))
        };
        Ok(Self {
            input_ids: row("input_ids", widen(encoding.get_ids()))?,
            attention_mask: row("attention_mask", mask.clone())?,
            token_type_ids: row("token_type_ids", widen(encoding.get_type_ids()))?,
            mask,
        })
    }

    /// Mean of the real (unmasked) token embeddings in `hidden`-wide rows.
    fn mean_pool(&self, token_embeddings: &[f32], hidden: usize) -> Vec<f32> {
        let mut pooled = vec![0.0f32; hidden];
        let mut real_tokens = 0.0f32;
        for (i, &m) in self.mask.iter().enumerate() {
            if m == 0 {
                continue;
            }
            let row = &token_embeddings[i * hidden..(i + 1) * hidden];
            for (acc, &v) in pooled.iter_mut().zip(row) {
                *acc += v;
            }
            real_tokens += 1.0;
        }
        if real_tokens > 0.0 {
            for v in &mut pooled {
                *v /= real_tokens;
            }
        }
        pooled
    }
}

/// Scales `vec` to unit L2 length in place. Zero vectors are left as-is.
fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}

/// ONNX-based embedder using all-MiniLM-L6-v2.
///
/// Loads the ONNX model and its `tokenizer.json` from disk and runs
/// single-threaded CPU inference.
pub struct OnnxEmbedder {
    /// `Session::run` needs `&mut self`; embedding calls serialize here.
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// Safety: the session is only reached through the mutex, one inference at a
// time; tokenizer encoding takes &self and holds no per-call state.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    /// Creates an embedder from `model.onnx`, with `tokenizer.json` expected
    /// in the same directory.
    pub fn new(model_path: &Path) -> Result<Self, UsherError> {
        let model_dir = model_path
            .parent()
            .ok_or_else(|| UsherError::Search("invalid model path".to_string()))?;
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            search_err(
                &format!("failed to load tokenizer {}", tokenizer_path.display()),
                e,
            )
        })?;

        let session = Session::builder()
            .map_err(|e| search_err("failed to create session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| search_err("failed to set optimization level", e))?
            .with_intra_threads(1)
            .map_err(|e| search_err("failed to set thread count", e))?
            .commit_from_file(model_path)
            .map_err(|e| {
                search_err(
                    &format!("failed to load model {}", model_path.display()),
                    e,
                )
            })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, UsherError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| search_err("tokenization failed", e))?;
        let batch = TokenBatch::from_encoding(&encoding)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| search_err("embedder mutex poisoned", e))?;
        let input_ids = TensorRef::from_array_view(&batch.input_ids)
            .map_err(|e| search_err("bad input_ids input", e))?;
        let attention_mask = TensorRef::from_array_view(&batch.attention_mask)
            .map_err(|e| search_err("bad attention_mask input", e))?;
        let token_type_ids = TensorRef::from_array_view(&batch.token_type_ids)
            .map_err(|e| search_err("bad token_type_ids input", e))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])
            .map_err(|e| search_err("inference failed", e))?;

        // Output shape is [1, seq_len, hidden]; pool over the token axis.
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| search_err("failed to extract output tensor", e))?;
        let hidden = shape[shape.len() - 1] as usize;
        let mut pooled = batch.mean_pool(data, hidden);
        l2_normalize(&mut pooled);
        Ok(pooled)
    }
}

impl Embedder for OnnxEmbedder {
    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UsherError> {
        texts.iter().map(|text| self.embed_text(text)).collect()
    }
}
