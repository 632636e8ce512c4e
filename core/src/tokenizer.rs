use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Two or more word characters, the usual bag-of-words token shape.
    static ref RE: Regex = Regex::new(r"(?u)\b\w\w+\b").expect("valid regex");
    static ref FRENCH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","ai","aie","aient","aies","ait","alors","as","au","aucun","aucuns","aura","aurai","auraient","aurais","aurait",
            "aussi","autre","aux","avaient","avais","avait","avant","avec","avez","aviez","avions","avoir","avons","ayant",
            "bon","car","ce","ceci","cela","celle","celles","celui","ces","cet","cette","ceux","chaque","ci","comme","comment",
            "d","dans","de","dedans","dehors","depuis","des","devrait","doit","donc","dos","du",
            "elle","elles","en","encore","es","est","et","étaient","étais","était","étant","été","être","eu","eux",
            "fait","faites","fois","font","hors","ici","il","ils","je","juste","la","le","les","leur","leurs","lui",
            "ma","maintenant","mais","me","même","mes","moi","moins","mon","mot","ne","ni","nos","notre","nous",
            "on","ont","ou","où","par","parce","pas","peu","peut","plupart","pour","pourquoi","qu","quand","que","quel",
            "quelle","quelles","quels","qui","sa","sans","se","sera","serait","ses","seulement","si","sien","son","sont",
            "sous","soyez","sujet","sur","ta","tandis","te","tellement","tels","tes","toi","ton","tous","tout","toute",
            "toutes","très","trop","tu","un","une","voient","vont","vos","votre","vous","vu","ça",
        ];
        words.iter().copied().collect()
    };
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Corpus language; selects the built-in stop-word list and the stemmer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    French,
    English,
}

impl Language {
    fn stop_words(self) -> &'static HashSet<&'static str> {
        match self {
            Language::French => &FRENCH_STOPWORDS,
            Language::English => &ENGLISH_STOPWORDS,
        }
    }

    fn algorithm(self) -> Algorithm {
        match self {
            Language::French => Algorithm::French,
            Language::English => Algorithm::English,
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "french" | "fr" => Ok(Language::French),
            "english" | "en" => Ok(Language::English),
            other => Err(format!("unsupported language '{other}' (expected french or english)")),
        }
    }
}

pub struct Tokenizer {
    builtin: &'static HashSet<&'static str>,
    extra: HashSet<String>,
    stemmer: Option<Stemmer>,
}

impl Tokenizer {
    pub fn new(language: Language, extra_stop_words: &[String], stem: bool) -> Self {
        let extra = extra_stop_words.iter().map(|w| normalize(w)).collect();
        Self {
            builtin: language.stop_words(),
            extra,
            stemmer: stem.then(|| Stemmer::create(language.algorithm())),
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.builtin.contains(token) || self.extra.contains(token)
    }

    /// NFKC-normalize, lowercase, split into word tokens, drop stop words and
    /// optionally stem what remains. Token order follows the input.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = normalize(text);
        let mut tokens = Vec::new();
        for mat in RE.find_iter(&normalized) {
            let token = mat.as_str();
            if self.is_stopword(token) {
                continue;
            }
            match &self.stemmer {
                Some(stemmer) => tokens.push(stemmer.stem(token).into_owned()),
                None => tokens.push(token.to_string()),
            }
        }
        tokens
    }
}

fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}
