use paperdex_core::config::{ExtractConfig, IndexConfig};
use paperdex_core::extract::{extract_corpus, SourceDocument};
use paperdex_core::persist::IndexStore;
use paperdex_core::{rebuild_from_documents, rebuild_index, search, Error, Language};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const LEUKEMIA: &str = "Leukemia is a cancer of the blood cells that begins in the bone marrow. \
It causes the marrow to produce large numbers of abnormal white blood cells. \
Treatment usually combines chemotherapy with supportive care for patients.";

const MITOCHONDRIA: &str = "Mitochondria produce most of the cellular energy used by eukaryotic cells. \
They convert nutrients into adenosine triphosphate through oxidative phosphorylation. \
Defects in this process are linked to several inherited metabolic disorders.";

const ANEMIA: &str = "Iron deficiency anemia reduces the oxygen carrying capacity of circulating red cells. \
Dietary supplementation and treatment of chronic bleeding restore normal hemoglobin levels \
in most affected patients within a few months of therapy.";

fn write_corpus(dir: &Path) {
    fs::write(dir.join("01-leukemia.txt"), LEUKEMIA).unwrap();
    fs::write(dir.join("02-mitochondria.txt"), MITOCHONDRIA).unwrap();
    fs::write(dir.join("03-anemia.md"), ANEMIA).unwrap();
    fs::write(dir.join("04-corrupt.pdf"), b"%PDF-1.4 truncated garbage").unwrap();
    fs::write(dir.join("05-references.txt"), "REFERENCES\n1. Smith J. Blood. 2019;12:1-9. doi:10.1/x \
        and a long enough list of further citation text to pass the minimum length filter easily")
        .unwrap();
    fs::write(dir.join("notes.docx"), b"ignored").unwrap();
}

fn config() -> ExtractConfig {
    // The sample documents are short; keep each one a single paragraph.
    ExtractConfig { flush_words: 200, ..ExtractConfig::default() }
}

#[test]
fn corpus_is_extracted_in_name_order_and_corrupt_files_are_skipped() {
    let corpus = tempdir().unwrap();
    write_corpus(corpus.path());
    let report = extract_corpus(corpus.path(), &config()).unwrap();

    assert_eq!(report.documents, vec!["01-leukemia.txt", "02-mitochondria.txt", "03-anemia.md", "05-references.txt"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "04-corrupt.pdf");

    let ids: Vec<_> = report.paragraphs.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    for p in &report.paragraphs {
        assert!(p.text.split_whitespace().count() >= 15);
        assert!(!p.text.to_uppercase().contains("REFERENCES"));
    }
}

#[test]
fn rebuild_then_search_end_to_end() {
    let corpus = tempdir().unwrap();
    let index = tempdir().unwrap();
    write_corpus(corpus.path());
    let store = IndexStore::new(index.path());

    let (report, _) = rebuild_index(corpus.path(), &store, &config(), IndexConfig::default()).unwrap();
    assert_eq!(report.generation, 1);
    assert_eq!(report.documents, 4);
    assert_eq!(report.paragraphs, 3);
    assert_eq!(report.skipped.len(), 1);

    let results = store.search("leukemia bone marrow", 3).unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].source_document, "01-leukemia.txt");
    assert_eq!(results[0].rank, 1);
    assert!(results[0].paragraph_text_highlighted.contains("<em>Leukemia</em>"));
    assert!(results[0].paragraph_text_highlighted.contains("<em>marrow</em>"));
    // three sentences summarized down to two, still highlighted
    assert!(results[0].summary_highlighted.len() < results[0].paragraph_text_highlighted.len());
    assert!(results[0].summary_highlighted.contains("<em>"));
}

#[test]
fn stored_paragraph_text_is_its_own_top_hit() {
    let corpus = tempdir().unwrap();
    let index = tempdir().unwrap();
    write_corpus(corpus.path());
    let store = IndexStore::new(index.path());
    let (_, handle) = rebuild_index(corpus.path(), &store, &config(), IndexConfig::default()).unwrap();

    for paragraph in handle.paragraphs() {
        let results = search(Some(&handle), &paragraph.text, 10).unwrap();
        assert_eq!(results[0].paragraph_id, paragraph.id);
        assert!(results.iter().all(|r| r.score <= results[0].score));
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }
}

#[test]
fn results_never_exceed_top_k_or_positive_scores() {
    let index = tempdir().unwrap();
    let store = IndexStore::new(index.path());
    let docs = vec![
        SourceDocument::new("p1.txt", "leukemia is a cancer of blood cells"),
        SourceDocument::new("p2.txt", "mitochondria produce cellular energy"),
    ];
    let extract = ExtractConfig { min_words: 1, min_document_words: 1, ..ExtractConfig::default() };
    let (_, handle) = rebuild_from_documents(docs, &store, &extract, IndexConfig::default()).unwrap();

    let results = search(Some(&handle), "leukemia blood", 5).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_document, "p1.txt");
    assert!(results[0].score > 0.0);

    assert_eq!(search(Some(&handle), "cells energy", 1).unwrap().len(), 1);
    assert_eq!(search(Some(&handle), "cells energy", 5).unwrap().len(), 2);
    assert!(search(Some(&handle), "photosynthesis", 5).unwrap().is_empty());
}

#[test]
fn held_handle_survives_a_republish() {
    let index = tempdir().unwrap();
    let store = IndexStore::new(index.path());
    let extract = ExtractConfig { min_words: 1, min_document_words: 1, ..ExtractConfig::default() };

    let first = vec![SourceDocument::new("a.txt", "leukemia blood marrow")];
    let (_, old) = rebuild_from_documents(first, &store, &extract, IndexConfig::default()).unwrap();

    let second = vec![SourceDocument::new("b.txt", "mitochondria cellular energy")];
    rebuild_from_documents(second, &store, &extract, IndexConfig::default()).unwrap();

    assert_eq!(search(Some(&old), "leukemia", 3).unwrap()[0].source_document, "a.txt");
    assert!(store.search("leukemia", 3).unwrap().is_empty());
    assert_eq!(store.search("energy", 3).unwrap()[0].source_document, "b.txt");
}

#[test]
fn empty_corpus_is_an_error_and_leaves_the_old_index() {
    let index = tempdir().unwrap();
    let store = IndexStore::new(index.path());
    let extract = ExtractConfig { min_words: 1, min_document_words: 1, ..ExtractConfig::default() };
    rebuild_from_documents(vec![SourceDocument::new("a.txt", "leukemia blood")], &store, &extract, IndexConfig::default())
        .unwrap();

    let err = rebuild_from_documents(vec![SourceDocument::new("x.pdf", b"junk".to_vec())], &store, &extract, IndexConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::EmptyCorpus));
    assert_eq!(store.current_generation().unwrap(), Some(1));
}

#[test]
fn querying_before_the_first_build_is_empty() {
    let index = tempdir().unwrap();
    let store = IndexStore::new(index.path().join("not-yet"));
    assert!(store.search("leukemia", 3).unwrap().is_empty());
}

#[test]
fn mismatched_vocabulary_is_reported_as_corrupt() {
    let index = tempdir().unwrap();
    let store = IndexStore::new(index.path());
    let extract = ExtractConfig { min_words: 1, min_document_words: 1, ..ExtractConfig::default() };
    rebuild_from_documents(vec![SourceDocument::new("a.txt", "leukemia blood")], &store, &extract, IndexConfig::default())
        .unwrap();
    rebuild_from_documents(
        vec![SourceDocument::new("b.txt", "mitochondria produce cellular energy")],
        &store,
        &extract,
        IndexConfig::default(),
    )
    .unwrap();

    // Splice generation 1's vocabulary into generation 2.
    let vocab = fs::read(index.path().join("gen-000001/vocabulary.bin")).unwrap();
    fs::write(index.path().join("gen-000002/vocabulary.bin"), vocab).unwrap();

    let err = store.search("energy", 3).unwrap_err();
    assert!(err.is_corrupt(), "{err}");
    assert!(err.to_string().contains("rebuild required"));
}

#[test]
fn query_language_follows_the_generation() {
    let index = tempdir().unwrap();
    let store = IndexStore::new(index.path());
    let extract = ExtractConfig { min_words: 1, min_document_words: 1, ..ExtractConfig::default() };
    let config = IndexConfig { language: Language::Indonesian, sublinear_tf: true };
    let docs = vec![
        SourceDocument::new("a.txt", "leukemia adalah kanker darah"),
        SourceDocument::new("b.txt", "mitokondria menghasilkan energi sel"),
    ];
    let (_, handle) = rebuild_from_documents(docs, &store, &extract, config).unwrap();
    assert_eq!(handle.meta().language, Language::Indonesian);
    assert!(handle.vocabulary().term_id("adalah").is_none());

    let loaded = store.load_current().unwrap().unwrap();
    assert_eq!(loaded.config(), config);
    let results = search(Some(&loaded), "apa itu kanker darah", 3).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_document, "a.txt");
}
