use paperdex_core::preprocess::{preprocess, tokens, Language};

#[test]
fn it_normalizes_without_stemming() {
    let toks = tokens("Running Runners RUN! The café's menu.", Language::English);
    // No stemming: inflected forms survive as written, lowercased
    assert!(toks.contains(&"running".to_string()));
    assert!(toks.contains(&"runners".to_string()));
    assert!(toks.contains(&"run".to_string()));
    // Apostrophes are deleted, accents kept
    assert!(toks.contains(&"cafés".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let toks = tokens("The quick brown fox and the lazy dog", Language::English);
    assert!(!toks.contains(&"the".to_string()));
    assert!(!toks.contains(&"and".to_string()));
    assert_eq!(toks, vec!["quick", "brown", "fox", "lazy", "dog"]);
}

#[test]
fn it_is_idempotent() {
    let samples = [
        "Leukemia is a CANCER of the blood-forming tissues (bone marrow).",
        "Résumé: ﬁndings in 2019–2021 showed p < 0.05!",
        "   ",
        "Sel darah putih, yang disebut leukosit, adalah bagian dari sistem imun.",
        "İstanbul ΣΊΣΥΦΟΣ straße",
        "cafe.\u{301} study",
    ];
    for language in [Language::English, Language::Indonesian] {
        for s in samples {
            let once = preprocess(s, language);
            assert_eq!(preprocess(&once, language), once, "input: {s:?}");
        }
    }
}

#[test]
fn it_joins_with_single_spaces() {
    let out = preprocess("  blood\t\n cells ,,, marrow ", Language::English);
    assert_eq!(out, "blood cells marrow");
}

#[test]
fn query_and_corpus_share_processing() {
    let paragraph = "Acute myeloid leukemia (AML) affects blood cells.";
    let query = "LEUKEMIA, blood!";
    let corpus_tokens = tokens(paragraph, Language::English);
    for t in tokens(query, Language::English) {
        assert!(corpus_tokens.contains(&t), "{t} missing");
    }
}
