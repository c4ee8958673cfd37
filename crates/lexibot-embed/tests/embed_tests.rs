use lexibot_core::traits::Embedder;
use lexibot_embed::{get_default_embedder, FakeEmbedder, EMBEDDING_DIM};
use std::path::Path;

#[test]
fn fake_embedder_shape_norm_and_determinism() {
    let embedder = FakeEmbedder::new(EMBEDDING_DIM);
    let texts = vec!["annual leave entitlement".to_string(), "annual leave entitlement".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let (v1, v2) = (&embs[0], &embs[1]);

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6, "same input embeds identically");
    }
}

#[test]
fn fake_embedder_ignores_case_and_punctuation() {
    let embedder = FakeEmbedder::new(EMBEDDING_DIM);
    let embs = embedder
        .embed_batch(&["Annual leave.".to_string(), "annual leave".to_string()])
        .expect("embed_batch");
    for (a, b) in embs[0].iter().zip(embs[1].iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn unrelated_texts_do_not_collide() {
    let embedder = FakeEmbedder::new(EMBEDDING_DIM);
    let embs = embedder
        .embed_batch(&[
            "annual leave entitlement".to_string(),
            "maritime salvage procedure".to_string(),
        ])
        .expect("embed_batch");
    let dot: f32 = embs[0].iter().zip(embs[1].iter()).map(|(a, b)| a * b).sum();
    assert!(dot < 0.9, "distinct texts should not embed identically (dot={dot})");
}

#[test]
fn env_toggle_selects_the_fake_embedder() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    let embedder = get_default_embedder(Path::new("/nonexistent/model/dir")).expect("embedder");
    assert_eq!(embedder.dim(), EMBEDDING_DIM);
    let embs = embedder.embed_batch(&["overtime pay".to_string()]).expect("embed");
    assert_eq!(embs[0].len(), EMBEDDING_DIM);
}
