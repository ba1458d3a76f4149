use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use groundqa_core::text::cosine;
use groundqa_core::traits::Embedder;
use groundqa_embed::{load_embedder, masked_mean_l2, shared_embedder, HashEmbedder};

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = load_embedder("hash:d256").expect("embedder");
    assert_eq!(embedder.dim(), 256);
    assert_eq!(embedder.model_id(), "hash:d256");

    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_checked(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];
    assert_eq!(v1.len(), 256);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn hash_embedder_ranks_shared_vocabulary_higher() {
    let e = HashEmbedder::new(384);
    let q = e.embed_one("what is a vector store used for").unwrap();
    let near = e.embed_one("a vector store is used for similarity search").unwrap();
    let far = e.embed_one("bake bread at two hundred degrees").unwrap();
    assert!(cosine(&q, &near) > cosine(&q, &far));
}

#[test]
fn bad_hash_ids_are_rejected() {
    assert!(load_embedder("hash:dX").is_err());
    assert!(load_embedder("hashy").is_err());
    assert!(load_embedder("hash:d0").is_err());
}

#[test]
fn shared_embedder_is_loaded_once_per_model() {
    let a = shared_embedder("hash:d64").unwrap();
    let b = shared_embedder("hash:d64").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    let c = shared_embedder("hash:d32").unwrap();
    assert_eq!(c.dim(), 32);
}

#[test]
fn masked_mean_l2_ignores_padding() {
    let dev = Device::Cpu;
    // Two tokens with hidden dim 4; the second token is padding.
    let h = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], (1, 2, 4), &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 0u32], (1, 2), &dev).unwrap();
    let out = masked_mean_l2(&h, &mask).unwrap();
    let v: Vec<Vec<f32>> = out.to_dtype(DType::F32).unwrap().to_vec2().unwrap();
    let norm: f32 = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
    let expected = [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm];
    for (a, b) in v[0].iter().copied().zip(expected) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
}
