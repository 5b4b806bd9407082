// ============================================================
// Layer 3 — Character Codec
// ============================================================
// Maps the fixed transcription vocabulary to dense class indices
// and back again.
//
// Vocabulary order (never reorder — trained models depend on it):
//   space, 0-9, a-z, A-Z, ASCII punctuation
//
// One extra class sits after the last character: the CTC blank.
// A decoder emits it for "no character at this timestep".
//
// Index -1 is the padding sentinel used by batched label
// sequences. Decoding skips it rather than failing.
//
// The lookup tables are built once on first use and never
// mutated afterwards.
//
// Reference: Rust Book §8 (Hash Maps)
//            std::sync::OnceLock documentation

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::domain::error::CodecError;

/// Every character a transcription may contain, in class order.
pub const CHARACTERS: &str = concat!(
    " ",
    "0123456789",
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~",
);

/// Number of model output classes: the vocabulary plus the blank.
pub const CLASSES: usize = CHARACTERS.len() + 1;

/// Index of the CTC blank class (always the last one).
pub const BLANK: usize = CLASSES - 1;

/// Index used to pad label sequences; dropped by `decode`.
pub const PADDING: i32 = -1;

struct Tables {
    char_to_index: HashMap<char, usize>,
    index_to_char: Vec<char>,
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let index_to_char: Vec<char> = CHARACTERS.chars().collect();
        let char_to_index = index_to_char
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect();
        Tables { char_to_index, index_to_char }
    })
}

/// The vocabulary as a slice, indexed by class.
pub fn alphabet() -> &'static [char] {
    &tables().index_to_char
}

/// True when `c` belongs to the vocabulary.
pub fn contains(c: char) -> bool {
    tables().char_to_index.contains_key(&c)
}

/// First character of `text` outside the vocabulary, if any.
pub fn first_unknown(text: &str) -> Option<char> {
    text.chars().find(|&c| !contains(c))
}

/// Encode a transcription into class indices.
pub fn encode(text: &str) -> Result<Vec<usize>, CodecError> {
    let table = &tables().char_to_index;
    text.chars()
        .map(|ch| {
            table.get(&ch).copied().ok_or_else(|| CodecError::UnknownCharacter {
                ch,
                text: text.to_string(),
            })
        })
        .collect()
}

/// Decode class indices back into text.
///
/// The padding sentinel and the blank are skipped, as is anything
/// else outside the vocabulary range, since none of them carries a
/// character.
pub fn decode(indices: &[i32]) -> String {
    let chars = &tables().index_to_char;
    indices
        .iter()
        .filter(|&&i| i != PADDING)
        .filter_map(|&i| usize::try_from(i).ok())
        .filter(|&i| i != BLANK)
        .filter_map(|i| chars.get(i).copied())
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_size() {
        // space + 10 digits + 52 letters + 32 punctuation
        assert_eq!(CHARACTERS.chars().count(), 95);
        assert_eq!(CLASSES, 96);
        assert_eq!(BLANK, 95);
    }

    #[test]
    fn test_round_trip_every_character() {
        for c in CHARACTERS.chars() {
            let s       = c.to_string();
            let indices = encode(&s).unwrap();
            let as_i32: Vec<i32> = indices.iter().map(|&i| i as i32).collect();
            assert_eq!(decode(&as_i32), s);
        }
    }

    #[test]
    fn test_class_order_is_fixed() {
        assert_eq!(encode(" 0aA!").unwrap(), vec![0, 1, 11, 37, 63]);
    }

    #[test]
    fn test_alphabet_matches_classes() {
        assert_eq!(alphabet().len(), BLANK);
        assert_eq!(alphabet()[11], 'a');
    }

    #[test]
    fn test_padding_is_dropped() {
        assert_eq!(decode(&[PADDING]), "");
        assert_eq!(decode(&[11, PADDING, 12, PADDING]), "ab");
    }

    #[test]
    fn test_unknown_character() {
        let err = encode("caf\u{e9}").unwrap_err();
        match err {
            CodecError::UnknownCharacter { ch, .. } => assert_eq!(ch, '\u{e9}'),
        }
        assert_eq!(first_unknown("tab\there"), Some('\t'));
        assert_eq!(first_unknown("fine"), None);
    }
}
