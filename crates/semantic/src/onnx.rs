use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use onnxruntime::environment::Environment;
use onnxruntime::ndarray::{Array, Array2};
use onnxruntime::session::Session;
use tokenizers::Tokenizer;
use tracing::info;

use crate::pooling::mean_pool;
use crate::vector::l2_normalize_in_place;
use crate::{Embedder, SemanticConfig, SemanticError};

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

thread_local! {
    // Sessions are not `Sync`; each worker thread loads its own copy on first use.
    static MODEL_CACHE: RefCell<HashMap<ModelKey, Rc<LoadedModel>>> =
        RefCell::new(HashMap::new());
}

#[derive(Debug, Hash, PartialEq, Eq, Clone)]
struct ModelKey {
    model_path: PathBuf,
    tokenizer_path: PathBuf,
}

struct LoadedModel {
    tokenizer: Tokenizer,
    session: RefCell<Session<'static>>,
}

impl LoadedModel {
    fn load(key: &ModelKey) -> Result<Self, SemanticError> {
        let tokenizer = Tokenizer::from_file(&key.tokenizer_path)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        let session = ort_environment()?
            .new_session_builder()
            .map_err(|e| SemanticError::Inference(e.to_string()))?
            .with_model_from_file(key.model_path.clone())
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        info!(
            model = %key.model_path.display(),
            inputs = session.inputs.len(),
            "onnx_model_loaded"
        );
        Ok(Self {
            tokenizer,
            session: RefCell::new(session),
        })
    }
}

fn ort_environment() -> Result<&'static Environment, SemanticError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("homolog-semantic")
            .build()
            .map_err(|e| SemanticError::Inference(e.to_string()))
    })
}

/// Local sentence-transformer inference (e.g. an exported all-MiniLM-L6-v2) through ONNX
/// Runtime.
///
/// Token embeddings are mean-pooled over the attention mask, then L2-normalized when
/// `normalize` is set. Inference runs synchronously on the calling thread.
#[derive(Debug, Clone)]
pub struct OnnxEmbedder {
    model_name: String,
    key: ModelKey,
    max_sequence_length: usize,
    normalize: bool,
}

impl OnnxEmbedder {
    /// Checks that the model files exist and loads them once so a broken export fails at
    /// startup rather than on the first query.
    pub fn from_config(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let model_path = existing_file(cfg.model_path.as_deref(), "model_path")?;
        let tokenizer_path = existing_file(cfg.tokenizer_path.as_deref(), "tokenizer_path")?;
        let embedder = Self {
            model_name: cfg.model_name.clone(),
            key: ModelKey {
                model_path,
                tokenizer_path,
            },
            max_sequence_length: cfg.max_sequence_length.max(1),
            normalize: cfg.normalize,
        };
        embedder.model()?;
        Ok(embedder)
    }

    fn model(&self) -> Result<Rc<LoadedModel>, SemanticError> {
        MODEL_CACHE.with(|cache| {
            let mut cache = cache.borrow_mut();
            if let Some(model) = cache.get(&self.key) {
                return Ok(model.clone());
            }
            let model = Rc::new(LoadedModel::load(&self.key)?);
            cache.insert(self.key.clone(), model.clone());
            Ok(model)
        })
    }

    /// Embeds `texts` in one session run, preserving order.
    pub fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.model()?;

        let mut encoded = Vec::with_capacity(texts.len());
        for text in texts {
            let encoding = model
                .tokenizer
                .encode(*text, true)
                .map_err(|e| SemanticError::Inference(e.to_string()))?;
            let ids: Vec<i64> = encoding.get_ids().iter().map(|&x| i64::from(x)).collect();
            let mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&x| i64::from(x))
                .collect();
            encoded.push((ids, mask));
        }

        let batch = pad_batch(encoded, self.max_sequence_length)?;
        let mut vectors = run_session(&model.session, batch)?;
        if self.normalize {
            vectors.iter_mut().for_each(|v| l2_normalize_in_place(v));
        }
        Ok(vectors)
    }
}

fn existing_file(path: Option<&Path>, field: &str) -> Result<PathBuf, SemanticError> {
    let path = path.ok_or_else(|| {
        SemanticError::InvalidConfig(format!("onnx mode requires {field}"))
    })?;
    if !path.is_file() {
        return Err(SemanticError::InvalidConfig(format!(
            "{field} {} does not exist",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Token ids and masks truncated and zero-padded to a common length.
#[derive(Debug, PartialEq)]
struct PaddedBatch {
    ids: Vec<i64>,
    masks: Vec<Vec<i64>>,
    seq_len: usize,
}

fn pad_batch(
    encoded: Vec<(Vec<i64>, Vec<i64>)>,
    max_sequence_length: usize,
) -> Result<PaddedBatch, SemanticError> {
    let seq_len = encoded
        .iter()
        .map(|(ids, _)| ids.len())
        .max()
        .unwrap_or(0)
        .clamp(1, max_sequence_length.max(1));

    let mut flat_ids = Vec::with_capacity(encoded.len() * seq_len);
    let mut masks = Vec::with_capacity(encoded.len());
    for (mut ids, mut mask) in encoded {
        if ids.len() != mask.len() {
            return Err(SemanticError::Inference(
                "tokenizer produced mismatched id/mask lengths".into(),
            ));
        }
        ids.resize(seq_len, 0);
        mask.resize(seq_len, 0);
        flat_ids.extend(ids);
        masks.push(mask);
    }
    Ok(PaddedBatch {
        ids: flat_ids,
        masks,
        seq_len,
    })
}

fn run_session(
    session: &RefCell<Session<'static>>,
    batch: PaddedBatch,
) -> Result<Vec<Vec<f32>>, SemanticError> {
    let PaddedBatch {
        ids,
        masks,
        seq_len,
    } = batch;
    let rows = masks.len();
    let input_ids: Array2<i64> = Array::from_shape_vec((rows, seq_len), ids)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let attn_mask: Array2<i64> = Array::from_shape_vec((rows, seq_len), masks.concat())
        .map_err(|e| SemanticError::Inference(e.to_string()))?;

    let mut guard = session.borrow_mut();
    let session_ref = &mut *guard;
    let mut inputs = Vec::with_capacity(session_ref.inputs.len());
    for input in &session_ref.inputs {
        let tensor = match input.name.as_str() {
            "input_ids" => input_ids.clone(),
            "attention_mask" => attn_mask.clone(),
            "token_type_ids" => Array::from_elem((rows, seq_len), 0_i64),
            other => {
                return Err(SemanticError::Inference(format!(
                    "unsupported model input '{other}'"
                )))
            }
        };
        inputs.push(tensor.into_dyn());
    }
    if inputs.is_empty() {
        return Err(SemanticError::Inference(
            "model did not declare any inputs".into(),
        ));
    }

    let outputs = session_ref
        .run::<i64, f32, _>(inputs)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let output = outputs
        .first()
        .ok_or_else(|| SemanticError::Inference("model returned no outputs".into()))?;
    let dims = output.shape().to_vec();
    let flat: Vec<f32> = output.iter().copied().collect();
    mean_pool(&flat, &dims, &masks)
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let mut vectors = self.embed_texts(&[text])?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(SemanticError::Inference(
                "model did not return exactly one vector".into(),
            )),
        }
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        self.embed_texts(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_batch_pads_to_longest_and_truncates() {
        let batch = pad_batch(
            vec![
                (vec![101, 7, 102], vec![1, 1, 1]),
                (vec![101, 102], vec![1, 1]),
            ],
            8,
        )
        .unwrap();
        assert_eq!(batch.seq_len, 3);
        assert_eq!(batch.ids, vec![101, 7, 102, 101, 102, 0]);
        assert_eq!(batch.masks, vec![vec![1, 1, 1], vec![1, 1, 0]]);

        let truncated = pad_batch(vec![(vec![1, 2, 3, 4], vec![1, 1, 1, 1])], 2).unwrap();
        assert_eq!(truncated.ids, vec![1, 2]);
        assert_eq!(truncated.masks, vec![vec![1, 1]]);
    }

    #[test]
    fn pad_batch_rejects_mismatched_mask() {
        assert!(pad_batch(vec![(vec![1, 2], vec![1])], 8).is_err());
    }

    #[test]
    fn missing_model_file_is_config_error() {
        let cfg = SemanticConfig {
            mode: "onnx".into(),
            model_path: Some("does/not/exist/model.onnx".into()),
            tokenizer_path: Some("does/not/exist/tokenizer.json".into()),
            ..Default::default()
        };
        match OnnxEmbedder::from_config(&cfg) {
            Err(SemanticError::InvalidConfig(msg)) => assert!(msg.contains("model_path")),
            other => panic!("unexpected result: {:?}", other.map(|e| e.model_name)),
        }
    }
}
