//! In-process sentence embedding with ONNX Runtime.
//!
//! Expects a sentence-transformers export (`model.onnx` + `tokenizer.json`)
//! in the model directory. Token embeddings are mean-pooled over the
//! attention mask and L2-normalized.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tokenizers::{PaddingParams, PaddingStrategy, TruncationParams, TruncationStrategy};
use tracing::info;

use super::{Embedder, normalize};
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimension: usize,
    uses_token_type_ids: bool,
}

/// Inference runs on the blocking thread pool so async workers stay free.
pub struct OnnxEmbedder {
    model: Arc<OnnxModel>,
    model_id: String,
    dimension: usize,
    batch_size: usize,
}

impl OnnxEmbedder {
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, EmbeddingError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            return Err(EmbeddingError::ModelError(format!(
                "model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| EmbeddingError::ModelError(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e: ort::Error| EmbeddingError::ModelError(e.to_string()))?
            .with_intra_threads(num_cpus())
            .map_err(|e: ort::Error| EmbeddingError::ModelError(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e: ort::Error| EmbeddingError::ModelError(e.to_string()))?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::TokenizerError(e.to_string()))?;

        // Long chunks are truncated to the model's context
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_tokens as usize,
                strategy: TruncationStrategy::LongestFirst,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::TokenizerError(e.to_string()))?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        info!(
            model = %config.model_id,
            dimension = config.dimension,
            "embedding model loaded"
        );

        let dimension = config.dimension as usize;
        Ok(Self {
            model: Arc::new(OnnxModel {
                session: Mutex::new(session),
                tokenizer,
                dimension,
                uses_token_type_ids,
            }),
            model_id: config.model_id.clone(),
            dimension,
            batch_size: (config.batch_size as usize).max(1),
        })
    }
}

/// The hidden size must equal the configured dimension; collections are
/// created at that size.
fn check_output_shape(shape: &[usize], dimension: usize) -> Result<(), EmbeddingError> {
    match shape {
        [_, _, hidden] if *hidden == dimension => Ok(()),
        [_, _, hidden] => Err(EmbeddingError::ModelError(format!(
            "model hidden size is {}, embedding.dimension is {}",
            hidden, dimension
        ))),
        _ => Err(EmbeddingError::ModelError(format!(
            "unexpected output shape: {:?}",
            shape
        ))),
    }
}

impl OnnxModel {
    fn embed_sync(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::TokenizerError(e.to_string()))?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut token_type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();
            for j in 0..ids.len() {
                input_ids[i * max_len + j] = i64::from(ids[j]);
                attention_mask[i * max_len + j] = i64::from(mask[j]);
                token_type_ids[i * max_len + j] = i64::from(types[j]);
            }
        }

        let to_tensor = |data: Vec<i64>| -> Result<Tensor<i64>, EmbeddingError> {
            let array = Array2::from_shape_vec((batch_size, max_len), data)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            Tensor::from_array(array).map_err(|e: ort::Error| EmbeddingError::ModelError(e.to_string()))
        };

        let ids_tensor = to_tensor(input_ids)?;
        let mask_tensor = to_tensor(attention_mask.clone())?;
        let types_tensor = to_tensor(token_type_ids)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::ModelError("session lock poisoned".to_string()))?;

        let outputs = if self.uses_token_type_ids {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => types_tensor
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor
            ])
        }
        .map_err(|e: ort::Error| EmbeddingError::ModelError(e.to_string()))?;

        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e: ort::Error| EmbeddingError::ModelError(e.to_string()))?;

        check_output_shape(hidden.shape(), self.dimension)?;

        let embeddings = (0..batch_size)
            .map(|i| {
                let mut pooled = vec![0f32; self.dimension];
                let mut count = 0f32;
                for j in 0..max_len {
                    if attention_mask[i * max_len + j] == 0 {
                        continue;
                    }
                    count += 1.0;
                    for (d, value) in pooled.iter_mut().enumerate() {
                        *value += hidden[[i, j, d]];
                    }
                }
                if count > 0.0 {
                    pooled.iter_mut().for_each(|v| *v /= count);
                }
                normalize(&pooled)
            })
            .collect();

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        let batch_size = self.batch_size;
        tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let mut all = Vec::with_capacity(texts.len());
            for batch in texts.chunks(batch_size) {
                all.extend(model.embed_sync(batch)?);
            }
            Ok(all)
        })
        .await
        .map_err(|e| EmbeddingError::ModelError(format!("embedding task failed: {}", e)))?
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
