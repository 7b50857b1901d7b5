use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref PUNCTUATION: Regex = Regex::new(r"[\p{P}\p{S}]").expect("valid regex");
    static ref WORD: Regex = Regex::new(r"[\p{L}\p{M}\p{N}]+").expect("valid regex");
    static ref ENGLISH: HashSet<&'static str> = ENGLISH_STOPWORDS.iter().copied().collect();
    static ref INDONESIAN: HashSet<&'static str> = INDONESIAN_STOPWORDS.iter().copied().collect();
}

// Punctuation is stripped before the stopword check, so contractions appear
// without apostrophes. Forms that collide with real words ("ill", "well",
// "shell") are left out.
const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "arent", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "cannot", "cant", "could", "couldnt", "did", "didnt", "do", "does",
    "doesnt", "doing", "dont", "down", "during", "each", "few", "for", "from", "further", "had",
    "hadnt", "has", "hasnt", "have", "havent", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "isnt", "it", "its", "itself",
    "just", "me", "more", "most", "mustnt", "my", "myself", "no", "nor", "not", "now", "of", "off",
    "on", "once", "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "shouldnt", "so", "some", "such", "than", "that", "thats", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "theyre", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "wasnt", "we", "were",
    "werent", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "wont", "would", "wouldnt", "you", "youre", "youve", "your", "yours", "yourself",
    "yourselves",
];

const INDONESIAN_STOPWORDS: &[&str] = &[
    "ada", "adalah", "agar", "akan", "anda", "antara", "apa", "apabila", "atas", "atau", "bagi",
    "bagaimana", "bahwa", "banyak", "beberapa", "belum", "beliau", "bila", "bisa", "dalam", "dan",
    "dapat", "dari", "demikian", "dengan", "di", "dia", "engkau", "hal", "hanya", "harus",
    "hingga", "ia", "ini", "itu", "jika", "juga", "kami", "kamu", "karena", "ke", "kemudian",
    "kepada", "ketika", "kita", "lagi", "lain", "lalu", "lebih", "maka", "mana", "masih",
    "meskipun", "mereka", "merupakan", "namun", "oleh", "pada", "para", "per", "pernah", "pun",
    "saat", "sampai", "sangat", "saya", "sebagai", "sebelum", "sebuah", "secara", "sedang",
    "sedangkan", "sehingga", "sejak", "selama", "semua", "seorang", "serta", "seperti",
    "setelah", "setiap", "siapa", "sudah", "suatu", "supaya", "tanpa", "telah", "tentang",
    "tersebut", "terhadap", "tetapi", "tiap", "tidak", "untuk", "walaupun", "yaitu", "yakni",
    "yang",
];

/// Stopword set applied by the preprocessor. Recorded in every index
/// generation so queries are processed the way the corpus was.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Indonesian,
}

impl Language {
    fn stopwords(self) -> &'static HashSet<&'static str> {
        match self {
            Language::English => &ENGLISH,
            Language::Indonesian => &INDONESIAN,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => f.write_str("english"),
            Language::Indonesian => f.write_str("indonesian"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "indonesian" | "id" => Ok(Language::Indonesian),
            other => Err(format!("unknown language '{other}', expected english or indonesian")),
        }
    }
}

pub fn is_stopword(token: &str, language: Language) -> bool {
    language.stopwords().contains(token)
}

/// Lowercase, strip punctuation, split into word tokens and drop stopwords.
///
/// Text is NFKC-normalized first so PDF ligatures and full-width forms fold
/// into their plain spellings. Punctuation is deleted rather than replaced,
/// so `don't` becomes `dont` and `COVID-19` becomes `covid19`.
pub fn tokens(text: &str, language: Language) -> Vec<String> {
    let folded = fold(text);
    WORD.find_iter(&folded)
        .map(|m| m.as_str())
        .filter(|token| !is_stopword(token, language))
        .map(str::to_string)
        .collect()
}

/// NFKC, lowercase and punctuation removal, without tokenizing. Deleting a
/// punctuation mark can leave a combining mark next to a new base character,
/// so the result is normalized once more.
pub fn fold(text: &str) -> String {
    let lowered = text.nfkc().collect::<String>().to_lowercase();
    PUNCTUATION.replace_all(&lowered, "").nfkc().collect()
}

/// Normalized form used for both corpus paragraphs and live queries: the
/// surviving tokens joined by single spaces.
pub fn preprocess(text: &str, language: Language) -> String {
    tokens(text, language).join(" ")
}
