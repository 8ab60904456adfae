//! Token rules: rebuild analyzer morphemes into display tokens
//!
//! The analyzer reports one reading per morpheme in katakana. For ruby output
//! we want hiragana over the kanji stem only, with the okurigana left bare:
//! `食べる/タベル` becomes `[食(た), べる]`.

use serde::{Deserialize, Serialize};

use super::{Token, TokenSequence};

/// Offset between the katakana and hiragana blocks
const KANA_OFFSET: u32 = 0x60;

/// Raw morpheme as produced by a dictionary-based analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Morpheme {
    #[serde(alias = "surface_form")]
    pub surface: String,
    #[serde(default)]
    pub reading: Option<String>,
}

impl Morpheme {
    pub fn new(surface: impl Into<String>, reading: Option<&str>) -> Self {
        Self {
            surface: surface.into(),
            reading: reading.map(str::to_string),
        }
    }
}

pub fn is_kanji(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}' | '々' | '〆')
}

pub fn is_hiragana(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{3096}')
}

pub fn is_katakana(c: char) -> bool {
    matches!(c, '\u{30A1}'..='\u{30F6}')
}

pub fn contains_kanji(text: &str) -> bool {
    text.chars().any(is_kanji)
}

fn to_hiragana_char(c: char) -> char {
    if is_katakana(c) {
        char::from_u32(c as u32 - KANA_OFFSET).unwrap_or(c)
    } else {
        c
    }
}

/// Convert every katakana character to hiragana, leaving the rest untouched
pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars().map(to_hiragana_char).collect()
}

/// Rebuild a morpheme list into display tokens
pub fn rebuild_tokens(morphemes: &[Morpheme]) -> TokenSequence {
    let mut tokens = Vec::with_capacity(morphemes.len());
    for morpheme in morphemes {
        push_morpheme(&mut tokens, morpheme);
    }
    tokens
}

fn push_morpheme(tokens: &mut TokenSequence, morpheme: &Morpheme) {
    let surface = morpheme.surface.as_str();
    let reading = match morpheme.reading.as_deref() {
        // unknown words come back with "*" or no reading at all
        Some(r) if !r.is_empty() && r != "*" => katakana_to_hiragana(r),
        _ => {
            tokens.push(Token::plain(surface));
            return;
        }
    };

    if !contains_kanji(surface) || katakana_to_hiragana(surface) == reading {
        tokens.push(Token::plain(surface));
        return;
    }

    let s: Vec<char> = surface.chars().collect();
    let r: Vec<char> = reading.chars().collect();

    // leading kana shared by surface and reading
    let mut head = 0;
    while head < s.len()
        && head < r.len()
        && !is_kanji(s[head])
        && to_hiragana_char(s[head]) == r[head]
    {
        head += 1;
    }

    // trailing kana shared by surface and reading
    let mut tail = 0;
    while tail < s.len() - head
        && tail < r.len() - head
        && !is_kanji(s[s.len() - 1 - tail])
        && to_hiragana_char(s[s.len() - 1 - tail]) == r[r.len() - 1 - tail]
    {
        tail += 1;
    }

    let stem: String = s[head..s.len() - tail].iter().collect();
    let stem_reading: String = r[head..r.len() - tail].iter().collect();

    if stem.is_empty() || stem_reading.is_empty() {
        tokens.push(Token::annotated(surface, reading));
        return;
    }

    if head > 0 {
        tokens.push(Token::plain(s[..head].iter().collect::<String>()));
    }
    tokens.push(Token::annotated(stem, stem_reading));
    if tail > 0 {
        tokens.push(Token::plain(s[s.len() - tail..].iter().collect::<String>()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_katakana_to_hiragana() {
        assert_eq!(katakana_to_hiragana("ソラ"), "そら");
        assert_eq!(katakana_to_hiragana("コーヒー"), "こーひー");
        assert_eq!(katakana_to_hiragana("abc空"), "abc空");
    }

    #[test]
    fn test_kana_only_morpheme_has_no_reading() {
        let tokens = rebuild_tokens(&[Morpheme::new("の", Some("ノ"))]);
        assert_eq!(tokens, vec![Token::plain("の")]);

        let tokens = rebuild_tokens(&[Morpheme::new("ツイート", Some("ツイート"))]);
        assert_eq!(tokens, vec![Token::plain("ツイート")]);
    }

    #[test]
    fn test_unknown_reading_is_plain() {
        let tokens = rebuild_tokens(&[
            Morpheme::new("𠮷", None),
            Morpheme::new("魑", Some("*")),
        ]);
        assert_eq!(tokens, vec![Token::plain("𠮷"), Token::plain("魑")]);
    }

    #[test]
    fn test_pure_kanji_gets_full_reading() {
        let tokens = rebuild_tokens(&[Morpheme::new("日本", Some("ニホン"))]);
        assert_eq!(tokens, vec![Token::annotated("日本", "にほん")]);
    }

    #[test]
    fn test_okurigana_split() {
        let tokens = rebuild_tokens(&[Morpheme::new("食べる", Some("タベル"))]);
        assert_eq!(tokens, vec![Token::annotated("食", "た"), Token::plain("べる")]);
    }

    #[test]
    fn test_leading_kana_split() {
        let tokens = rebuild_tokens(&[Morpheme::new("お茶", Some("オチャ"))]);
        assert_eq!(tokens, vec![Token::plain("お"), Token::annotated("茶", "ちゃ")]);
    }

    #[test]
    fn test_sentence_rebuild() {
        let morphemes = vec![
            Morpheme::new("空", Some("ソラ")),
            Morpheme::new("が", Some("ガ")),
            Morpheme::new("青い", Some("アオイ")),
        ];
        let tokens = rebuild_tokens(&morphemes);
        assert_eq!(
            tokens,
            vec![
                Token::annotated("空", "そら"),
                Token::plain("が"),
                Token::annotated("青", "あお"),
                Token::plain("い"),
            ]
        );
    }

    #[test]
    fn test_morpheme_from_kuromoji_shape() {
        let m: Morpheme =
            serde_json::from_str(r#"{"surface_form":"海","reading":"ウミ","pos":"名詞"}"#).unwrap();
        assert_eq!(m, Morpheme::new("海", Some("ウミ")));
    }
}
