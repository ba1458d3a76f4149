//! groundqa-embed
//!
//! Embedding providers behind `groundqa_core::traits::Embedder`: a local BERT
//! sentence encoder and a hashing embedder for tests and offline runs. Loaded
//! models are cached process-wide per model id (see `shared_embedder`).
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use twox_hash::XxHash64;

use groundqa_core::traits::Embedder;

pub mod bert;
pub mod device;
pub mod pool;

pub use bert::BertEmbedder;
pub use pool::masked_mean_l2;

pub const HASH_MODEL_PREFIX: &str = "hash";
pub const DEFAULT_HASH_DIM: usize = 384;

/// Deterministic bag-of-words embedder: every lowercase word is hashed into a
/// signed bucket, then the vector is L2-normalised. Texts sharing words land
/// close together, which is enough for pipeline tests without model weights.
pub struct HashEmbedder {
    dim: usize,
    model_id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, model_id: format!("{}:d{}", HASH_MODEL_PREFIX, dim) }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str { &self.model_id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Build an embedder for `model_id`.
///
/// `hash` / `hash:d<N>` select the hashing embedder, as does
/// `APP_USE_FAKE_EMBEDDINGS=1`; anything else is loaded as a local BERT model.
pub fn load_embedder(model_id: &str) -> Result<Box<dyn Embedder>> {
    if let Some(rest) = model_id.strip_prefix(HASH_MODEL_PREFIX) {
        let dim = match rest.strip_prefix(":d") {
            Some(d) => d.parse::<usize>().map_err(|_| anyhow!("Bad hash embedder id '{}'", model_id))?,
            None if rest.is_empty() => DEFAULT_HASH_DIM,
            None => return Err(anyhow!("Bad hash embedder id '{}'", model_id)),
        };
        if dim == 0 {
            return Err(anyhow!("Bad hash embedder id '{}'", model_id));
        }
        return Ok(Box::new(HashEmbedder::new(dim)));
    }
    if use_fake_embeddings() {
        tracing::warn!(requested = model_id, "APP_USE_FAKE_EMBEDDINGS set, using hashing embedder");
        return Ok(Box::new(HashEmbedder::new(DEFAULT_HASH_DIM)));
    }
    let dir = resolve_model_dir(model_id)?;
    Ok(Box::new(BertEmbedder::load(model_id, &dir)?))
}

static EMBEDDERS: OnceLock<Mutex<HashMap<String, Arc<dyn Embedder>>>> = OnceLock::new();

/// Process-wide embedder for `model_id`, loaded on first use and shared after.
pub fn shared_embedder(model_id: &str) -> Result<Arc<dyn Embedder>> {
    let cache = EMBEDDERS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().map_err(|_| anyhow!("Embedder cache lock poisoned"))?;
    if let Some(existing) = guard.get(model_id) {
        return Ok(Arc::clone(existing));
    }
    let embedder: Arc<dyn Embedder> = Arc::from(load_embedder(model_id)?);
    guard.insert(model_id.to_string(), Arc::clone(&embedder));
    Ok(embedder)
}

/// Locate a model directory. Tried in order: `$APP_MODEL_DIR/<name>`,
/// `$APP_MODEL_DIR`, `models/<name>`, `../models/<name>`, and `model_id` as a path,
/// where `<name>` is the last `/` segment of the id.
pub fn resolve_model_dir(model_id: &str) -> Result<PathBuf> {
    let name = model_id.rsplit('/').next().unwrap_or(model_id);
    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let root = PathBuf::from(dir);
        candidates.push(root.join(name));
        candidates.push(root);
    }
    candidates.push(PathBuf::from("models").join(name));
    candidates.push(PathBuf::from("../models").join(name));
    candidates.push(PathBuf::from(model_id));

    candidates
        .into_iter()
        .find(|p| p.join("tokenizer.json").exists())
        .inspect(|p| tracing::info!(dir = %p.display(), "Using model dir"))
        .ok_or_else(|| anyhow!("Could not locate model directory for '{}' (set APP_MODEL_DIR)", model_id))
}
