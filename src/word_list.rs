use fancy_regex::Regex;
use smallvec::{smallvec, SmallVec};
use std::collections::HashMap;
use std::{fmt, fs};
use unicode_normalization::UnicodeNormalization;

use crate::types::{GlyphId, WordId};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// A struct representing a word in the word list.
#[derive(Debug, Clone)]
pub struct Word {
    /// The word as it would appear in a filled grid: uppercase, no whitespace.
    pub string: String,

    /// The glyph ids making up `string`.
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

/// Given a raw word string from a dictionary file, turn it into the normalized form used
/// everywhere in the solver. Comparisons downstream are exact-match on this form.
#[must_use]
pub fn normalize_word(raw: &str) -> String {
    raw.to_uppercase()
        .nfc() // Normalize Unicode combining forms
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone)]
pub enum WordListError {
    InvalidPath(String),
}

impl fmt::Display for WordListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordListError::InvalidPath(path) => write!(f, "Can’t read file: “{path}”"),
        }
    }
}

/// A struct representing the loaded word list. This is static regardless of grid geometry,
/// although `max_length` is usually set from the grid's longest side since words that can't fit
/// any slot are dead weight.
pub struct WordList {
    /// A list of all characters that occur in any (normalized) word. `GlyphId`s used everywhere
    /// else are indices into this list.
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,

    /// The inverse of `glyphs`: a map from a character to the `GlyphId` representing it.
    pub glyph_id_by_char: HashMap<char, GlyphId>,

    /// All loaded words, bucketed by length: `words[n]` holds the words of length `n`, sorted
    /// lexicographically and deduplicated, so ascending `WordId` order is lexicographic order.
    /// `words[0]` is always an empty vec.
    pub words: Vec<Vec<Word>>,
}

impl WordList {
    /// Construct a `WordList` from raw entries. Entries are normalized before use; empty entries,
    /// entries longer than `max_length`, and entries not matching `filter` are skipped.
    #[must_use]
    pub fn from_words<S: AsRef<str>>(
        raw_words: &[S],
        max_length: Option<usize>,
        filter: Option<&Regex>,
    ) -> WordList {
        let mut normalized: Vec<String> = raw_words
            .iter()
            .map(|raw| normalize_word(raw.as_ref()))
            .filter(|word| !word.is_empty())
            .filter(|word| max_length.map_or(true, |max| word.chars().count() <= max))
            .filter(|word| {
                filter.map_or(true, |pattern| pattern.is_match(word).unwrap_or(false))
            })
            .collect();

        normalized.sort();
        normalized.dedup();

        let mut instance = WordList {
            glyphs: smallvec![],
            glyph_id_by_char: HashMap::new(),
            words: vec![vec![]],
        };

        for word in &normalized {
            instance.add_word(word);
        }

        instance
    }

    /// Construct a `WordList` from the contents of a dictionary file, one word per line.
    #[must_use]
    pub fn from_contents(
        contents: &str,
        max_length: Option<usize>,
        filter: Option<&Regex>,
    ) -> WordList {
        let lines: Vec<&str> = contents.lines().collect();
        WordList::from_words(&lines, max_length, filter)
    }

    /// Construct a `WordList` by reading a dictionary file, one word per line.
    pub fn from_dict_file(
        path: &str,
        max_length: Option<usize>,
        filter: Option<&Regex>,
    ) -> Result<WordList, WordListError> {
        let contents =
            fs::read_to_string(path).map_err(|_| WordListError::InvalidPath(path.into()))?;

        Ok(WordList::from_contents(&contents, max_length, filter))
    }

    fn add_word(&mut self, normalized: &str) {
        let glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]> = normalized
            .chars()
            .map(|c| self.glyph_id_for_char(c))
            .collect();

        let length = glyphs.len();

        while self.words.len() < length + 1 {
            self.words.push(vec![]);
        }

        self.words[length].push(Word {
            string: normalized.to_string(),
            glyphs,
        });
    }

    /// Retrieve the id of the glyph representing the given char, interning it if needed.
    pub fn glyph_id_for_char(&mut self, ch: char) -> GlyphId {
        match self.glyph_id_by_char.get(&ch) {
            Some(&glyph_id) => glyph_id,
            None => {
                let glyph_id = self.glyphs.len();
                self.glyphs.push(ch);
                self.glyph_id_by_char.insert(ch, glyph_id);
                glyph_id
            }
        }
    }

    /// The words of the given length, or an empty slice if none were loaded.
    #[must_use]
    pub fn bucket(&self, length: usize) -> &[Word] {
        self.words.get(length).map_or(&[], Vec::as_slice)
    }

    /// Borrow an existing word by length and id.
    #[must_use]
    pub fn word(&self, length: usize, word_id: WordId) -> &Word {
        &self.words[length][word_id]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use crate::word_list::{normalize_word, WordList, WordListError};
    use fancy_regex::Regex;

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("hello"), "HELLO");
        assert_eq!(normalize_word("  At\t"), "AT");
        assert_eq!(normalize_word("ok"), "OK");
    }

    #[test]
    fn test_buckets_are_sorted_and_deduplicated() {
        let word_list = WordList::from_words(&["to", "AT", "at", "ok", "an", "tea"], None, None);

        let bucket: Vec<&str> = word_list.bucket(2).iter().map(|w| w.string.as_str()).collect();
        assert_eq!(bucket, vec!["AN", "AT", "OK", "TO"]);

        let bucket: Vec<&str> = word_list.bucket(3).iter().map(|w| w.string.as_str()).collect();
        assert_eq!(bucket, vec!["TEA"]);

        assert!(word_list.bucket(5).is_empty());
        assert!(!word_list.is_empty());
    }

    #[test]
    fn test_glyphs_are_interned_across_words() {
        let word_list = WordList::from_words(&["AT", "TA"], None, None);

        let at = word_list.word(2, 0);
        let ta = word_list.word(2, 1);
        assert_eq!(at.glyphs[0], ta.glyphs[1]);
        assert_eq!(at.glyphs[1], ta.glyphs[0]);
        assert_eq!(word_list.glyphs.len(), 2);
    }

    #[test]
    fn test_max_length_skips_long_words() {
        let word_list = WordList::from_words(&["AT", "LONGWORD"], Some(3), None);

        assert_eq!(word_list.bucket(2).len(), 1);
        assert!(word_list.bucket(8).is_empty());
    }

    #[test]
    fn test_filter_keeps_only_matching_words() {
        let pattern = Regex::new("^A").unwrap();
        let word_list = WordList::from_words(&["AN", "AT", "OK", "TO"], None, Some(&pattern));

        let bucket: Vec<&str> = word_list.bucket(2).iter().map(|w| w.string.as_str()).collect();
        assert_eq!(bucket, vec!["AN", "AT"]);
    }

    #[test]
    fn test_missing_dict_file_is_an_error() {
        let result = WordList::from_dict_file("/nonexistent/words.txt", None, None);
        assert!(matches!(result, Err(WordListError::InvalidPath(_))));
    }
}
