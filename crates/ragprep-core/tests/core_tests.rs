use figment::providers::{Format, Toml};
use figment::{Figment, Jail};

use ragprep_core::blob::{BlobError, FsBlobStore, MemoryBlobStore};
use ragprep_core::config::{Config, EmbedSettings};
use ragprep_core::error::Error;
use ragprep_core::traits::BlobStore;
use ragprep_core::types::{BatchRequest, BatchResult, Document, EmbeddingRecord};
use ragprep_core::window::{describe, total_batches, window};

fn settings_from(toml: &str) -> Result<EmbedSettings, Error> {
    Config::from_figment(Figment::new().merge(Toml::string(toml))).embed_settings()
}

#[test]
fn windows_partition_the_corpus_exactly() {
    for len in 0..40usize {
        for batch_size in 1..12usize {
            let items: Vec<usize> = (0..len).collect();
            let total = total_batches(len, batch_size).unwrap();
            assert_eq!(total, (len + batch_size - 1) / batch_size);

            let mut covered = Vec::new();
            for batch_index in 0..total {
                let (slice, t) = window(&items, batch_index, batch_size).unwrap();
                assert_eq!(t, total);
                assert!(!slice.is_empty() && slice.len() <= batch_size);
                covered.extend_from_slice(slice);
            }
            assert_eq!(covered, items, "len={len} batch_size={batch_size}");
        }
    }
}

#[test]
fn last_window_is_partial_and_empty_corpus_has_no_batches() {
    let items: Vec<u32> = (0..53).collect();
    let (last, total) = window(&items, 5, 10).unwrap();
    assert_eq!(total, 6);
    assert_eq!(last, &[50, 51, 52]);

    let empty: Vec<u32> = Vec::new();
    let (slice, total) = window(&empty, 0, 25).unwrap();
    assert!(slice.is_empty());
    assert_eq!(total, 0);
}

#[test]
fn window_past_the_end_is_empty_not_an_error() {
    let items = vec!["a", "b", "c"];
    let (slice, total) = window(&items, 7, 2).unwrap();
    assert!(slice.is_empty());
    assert_eq!(total, 2);

    let desc = describe(items.len(), 7, 2).unwrap();
    assert_eq!(desc.start, 14);
    assert_eq!(desc.end, 3);
    assert!(desc.is_empty());
    assert!(desc.is_past_end());
}

#[test]
fn zero_batch_size_is_rejected() {
    let err = window(&[1, 2, 3], 0, 0).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn document_defaults_follow_the_corpus_format() {
    let docs: Vec<Document> = serde_json::from_str(
        r#"[{"id":"a","text":"hello","extra":1},{"text":"x"},{"id":"c","chunk_id":"c#2","title":"T","url":"u"}]"#,
    )
    .unwrap();
    assert_eq!(docs[0].chunk_id(), "a");
    assert_eq!(docs[1].id, "unknown");
    assert_eq!(docs[2].chunk_id(), "c#2");
    assert!(docs[2].is_blank());

    let rec = EmbeddingRecord::from_document(&docs[0], vec![0.5, 0.25]);
    assert_eq!(rec.doc_id, "a");
    assert_eq!(rec.chunk_id, "a");
    assert_eq!(rec.title, "");
    assert_eq!(rec.url, "");
}

#[test]
fn numeric_ids_are_read_as_strings() {
    let docs: Vec<Document> = serde_json::from_str(
        r#"[{"id":7,"text":"x"},{"id":"a","chunk_id":12,"text":"y"},{"id":null,"title":null,"url":null,"text":"z"}]"#,
    )
    .unwrap();
    assert_eq!(docs[0].id, "7");
    assert_eq!(docs[0].chunk_id(), "7");
    assert_eq!(docs[1].chunk_id(), "12");
    assert_eq!(docs[2].id, "unknown");
    assert_eq!(docs[2].title, None);
}

#[test]
fn whitespace_only_text_is_blank() {
    assert!(Document::new("x", " \n\t ").is_blank());
    assert!(!Document::new("x", " hi ").is_blank());
}

#[test]
fn batch_io_wire_shapes() {
    let req: BatchRequest = serde_json::from_str(r#"{"batch_index": 3}"#).unwrap();
    assert_eq!(req, BatchRequest { batch_index: 3, batch_size: None });
    let req: BatchRequest = serde_json::from_str("{}").unwrap();
    assert_eq!(req.batch_index, 0);

    let res = BatchResult { batch_index: 5, output_key: None, docs_embedded: 0, total_batches: 3 };
    let v = serde_json::to_value(&res).unwrap();
    assert_eq!(
        v,
        serde_json::json!({"batch_index": 5, "output_key": null, "docs_embedded": 0, "total_batches": 3})
    );
}

#[test]
fn settings_apply_documented_defaults() {
    let s = settings_from(r#"corpus_location = "corpus-bucket""#).unwrap();
    assert_eq!(s, EmbedSettings::new("corpus-bucket"));
    assert_eq!(s.corpus_key, "processed/corpus.json");
    assert_eq!(s.output_location, "corpus-bucket");
    assert_eq!(s.output_prefix, "embeddings/");
    assert_eq!(s.model_id, "amazon.titan-embed-text-v2:0");
    assert_eq!(s.batch_size, 25);
    assert_eq!(s.max_retries, 3);
    assert_eq!(s.endpoint(), "https://bedrock-runtime.us-east-1.amazonaws.com");
}

#[test]
fn settings_overrides_and_validation() {
    let s = settings_from(
        r#"
        corpus_location = "in"
        output_location = "out"
        batch_size = 7
        region = "eu-west-1"
        use_fake_embeddings = 1
        embed_endpoint = "http://localhost:9000/"
        "#,
    )
    .unwrap();
    assert_eq!(s.output_location, "out");
    assert_eq!(s.batch_size, 7);
    assert!(s.use_fake_embeddings);
    assert_eq!(s.endpoint(), "http://localhost:9000");

    assert!(matches!(settings_from("batch_size = 3"), Err(Error::InvalidConfig(_))));
    assert!(matches!(
        settings_from("corpus_location = \"in\"\nbatch_size = 0"),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        settings_from("corpus_location = \"in\"\nmax_retries = 0"),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn fs_blob_store_overwrites_whole_objects() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = FsBlobStore::new(tmp.path());

    store.put("bucket", "embeddings/batch_0000.json", b"[1]", "application/json").unwrap();
    store.put("bucket", "embeddings/batch_0000.json", b"[2]", "application/json").unwrap();
    assert_eq!(store.get("bucket", "embeddings/batch_0000.json").unwrap(), b"[2]");
    assert!(tmp.path().join("bucket/embeddings/batch_0000.json").is_file());

    let leftovers = std::fs::read_dir(tmp.path().join("bucket/embeddings")).unwrap().count();
    assert_eq!(leftovers, 1, "no temp files left next to the object");
}

#[test]
fn fs_blob_store_reports_missing_and_rejects_escaping_keys() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = FsBlobStore::new(tmp.path());
    assert!(matches!(store.get("bucket", "missing.json"), Err(BlobError::NotFound(_))));
    assert!(matches!(store.get("bucket", "../etc/passwd"), Err(BlobError::InvalidKey(_))));
    assert!(matches!(store.put("bucket", "", b"", "text/plain"), Err(BlobError::InvalidKey(_))));
}

#[test]
fn memory_blob_store_counts_writes() {
    let store = MemoryBlobStore::new();
    store.insert("b", "seed.json", "[]");
    assert_eq!(store.put_count(), 0);
    store.put("b", "k.json", b"{}", "application/json").unwrap();
    assert_eq!(store.put_count(), 1);
    assert_eq!(store.keys("b"), vec!["k.json".to_string(), "seed.json".to_string()]);
    assert_eq!(store.object("b", "k.json").unwrap().content_type, "application/json");
}

#[test]
fn env_region_takes_precedence_over_aws_region() {
    Jail::expect_with(|jail| {
        jail.set_env("CORPUS_LOCATION", "corpus-bucket");
        jail.set_env("REGION", "ap-south-1");
        jail.set_env("AWS_REGION", "eu-west-1");
        let s = Config::from_figment(Config::figment_for_env("test")).embed_settings().unwrap();
        assert_eq!(s.region, "ap-south-1");
        Ok(())
    });
}

#[test]
fn aws_region_fills_in_when_region_is_unset() {
    Jail::expect_with(|jail| {
        jail.set_env("CORPUS_LOCATION", "corpus-bucket");
        jail.set_env("AWS_REGION", "eu-west-1");
        let s = Config::from_figment(Config::figment_for_env("test")).embed_settings().unwrap();
        assert_eq!(s.region, "eu-west-1");
        assert_eq!(s.endpoint(), "https://bedrock-runtime.eu-west-1.amazonaws.com");
        Ok(())
    });
}

#[test]
fn env_overrides_toml_and_parses_flags() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "ragprep.toml",
            r#"
            corpus_location = "from-file"
            batch_size = 5
            model_id = "file-model"
            "#,
        )?;
        jail.set_env("CORPUS_LOCATION", "from-env");
        jail.set_env("batch_size", "9");
        jail.set_env("USE_FAKE_EMBEDDINGS", "1");
        jail.set_env("FAKE_DIMENSION", "32");
        let s = Config::from_figment(Config::figment_for_env("test")).embed_settings().unwrap();
        assert_eq!(s.corpus_location, "from-env");
        assert_eq!(s.batch_size, 9);
        assert_eq!(s.model_id, "file-model");
        assert!(s.use_fake_embeddings);
        assert_eq!(s.fake_dimension, 32);
        Ok(())
    });
}

#[test]
fn numeric_looking_env_strings_stay_strings() {
    Jail::expect_with(|jail| {
        jail.set_env("CORPUS_LOCATION", "2024");
        jail.set_env("OUTPUT_PREFIX", "42");
        jail.set_env("MODEL_ID", "7.5");
        jail.set_env("USE_FAKE_EMBEDDINGS", "false");
        let s = Config::from_figment(Config::figment_for_env("test")).embed_settings().unwrap();
        assert_eq!(s.corpus_location, "2024");
        assert_eq!(s.output_location, "2024");
        assert_eq!(s.output_prefix, "42");
        assert_eq!(s.model_id, "7.5");
        assert!(!s.use_fake_embeddings);
        Ok(())
    });
}
