// ============================================================
// Layer 5 — CTC Decoder
// ============================================================
// Turns a recogniser's per-timestep class probabilities into text.
//
// Input: one row per timestep, one column per class. The last
// column is the blank. Only the first `length` rows are valid;
// anything after them is padding from batching.
//
// Greedy decoding (beam width 1):
//   take the most likely class at every timestep, then collapse
//   runs of the same class and drop blanks.
//
//     a a _ a b b _   →   a a b   (the blank separates the two a's)
//
// Prefix beam search (beam width > 1):
//   keep the `width` most likely prefixes. Each prefix carries two
//   probabilities: ending in a blank, and ending in its last
//   character. Extending with the same character as the last one
//   only starts a new character when the prefix ended in a blank;
//   otherwise the step merges into the existing character.
//
//   A LanguageModel can weight each extension and each finished
//   prefix. Uniform leaves the acoustic scores untouched.
//
//   Scores are kept as natural logs. Ink-length inputs run to
//   thousands of rows, and a product of that many probabilities
//   underflows f32 long before the end.
//
// Both paths produce class indices that go through the character
// codec's decode, so blanks and out-of-range classes never leak
// into the output text.
//
// Reference: Graves et al. (2006) Connectionist Temporal Classification
//            Hannun et al. (2014) First-Pass LVCSR with Prefix Search

use anyhow::{ensure, Result};
use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use crate::domain::charset;

/// Weights candidate characters during beam search.
pub trait LanguageModel {
    /// Relative odds of `ch` following `prefix`.
    fn odds(&self, prefix: &str, ch: char) -> f32;

    /// Relative odds of `prefix` being a complete transcription.
    fn odds_end(&self, _prefix: &str) -> f32 {
        1.0
    }
}

impl<L: LanguageModel + ?Sized> LanguageModel for Box<L> {
    fn odds(&self, prefix: &str, ch: char) -> f32 {
        (**self).odds(prefix, ch)
    }

    fn odds_end(&self, prefix: &str) -> f32 {
        (**self).odds_end(prefix)
    }
}

/// Every character is equally likely.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl LanguageModel for Uniform {
    fn odds(&self, _prefix: &str, _ch: char) -> f32 {
        1.0
    }
}

/// Only characters from a fixed set may appear.
#[derive(Debug, Clone, Default)]
pub struct AllowedChars {
    allowed: HashSet<char>,
}

impl AllowedChars {
    pub fn new(chars: impl IntoIterator<Item = char>) -> Self {
        Self { allowed: chars.into_iter().collect() }
    }
}

impl LanguageModel for AllowedChars {
    fn odds(&self, _prefix: &str, ch: char) -> f32 {
        if self.allowed.contains(&ch) { 1.0 } else { 0.0 }
    }
}

/// ln(x), with impossible (zero or negative) odds mapped to -inf
fn ln(x: f32) -> f32 {
    if x > 0.0 { x.ln() } else { f32::NEG_INFINITY }
}

/// ln(e^a + e^b) without leaving log space
fn log_add(a: f32, b: f32) -> f32 {
    if a == f32::NEG_INFINITY {
        return b;
    }
    if b == f32::NEG_INFINITY {
        return a;
    }
    let max = a.max(b);
    max + ((a - max).exp() + (b - max).exp()).ln()
}

/// Log probability of a prefix, split by how it ends.
#[derive(Debug, Clone, Copy)]
struct Prob {
    blank:    f32,
    nonblank: f32,
}

impl Default for Prob {
    fn default() -> Self {
        Self { blank: f32::NEG_INFINITY, nonblank: f32::NEG_INFINITY }
    }
}

impl Prob {
    const START: Prob = Prob { blank: 0.0, nonblank: f32::NEG_INFINITY };

    fn total(self) -> f32 {
        log_add(self.blank, self.nonblank)
    }
}

fn accumulate(slot: &mut f32, log_p: f32) {
    *slot = log_add(*slot, log_p);
}

fn by_probability(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Index of the largest value; the first one wins ties.
fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max { (i, v) } else { (best, max) }
        })
        .0
}

fn spell(prefix: &[usize], alphabet: &[char]) -> String {
    prefix.iter().filter_map(|&c| alphabet.get(c)).collect()
}

/// Greedy best path: argmax per row, repeats collapsed, blanks removed.
pub fn greedy_path<R: AsRef<[f32]>>(rows: &[R]) -> Vec<usize> {
    let mut path = Vec::new();
    let mut last = None;

    for row in rows {
        let row   = row.as_ref();
        let blank = row.len().saturating_sub(1);
        let class = argmax(row);
        if class != blank && last != Some(class) {
            path.push(class);
        }
        last = Some(class);
    }
    path
}

/// Prefix beam search over `rows`, whose last column is the blank.
///
/// Returns every surviving prefix as class indices with its final
/// log score, best first.
pub fn beam_paths<R, L>(
    rows:       &[R],
    beam_width: usize,
    alphabet:   &[char],
    lm:         &L,
) -> Vec<(Vec<usize>, f32)>
where
    R: AsRef<[f32]>,
    L: LanguageModel + ?Sized,
{
    let blank = alphabet.len();

    let mut beams: Vec<(Vec<usize>, Prob)> = vec![(Vec::new(), Prob::START)];
    let mut candidates: HashMap<Vec<usize>, Prob> = HashMap::new();

    for row in rows {
        for (prefix, current) in &beams {
            let text = spell(prefix, alphabet);

            for (class, &p) in row.as_ref().iter().enumerate() {
                let log_p = ln(p);
                if log_p == f32::NEG_INFINITY {
                    continue;
                }
                if class == blank {
                    let slot = &mut candidates.entry(prefix.clone()).or_default().blank;
                    accumulate(slot, current.total() + log_p);
                    continue;
                }
                let Some(&ch) = alphabet.get(class) else {
                    continue;
                };

                let odds = ln(lm.odds(&text, ch));
                let mut extended = prefix.clone();
                extended.push(class);

                if prefix.last() == Some(&class) {
                    // same character again: merge, unless a blank separated them
                    let merged = &mut candidates.entry(prefix.clone()).or_default().nonblank;
                    accumulate(merged, current.nonblank + log_p);
                    let fresh = &mut candidates.entry(extended).or_default().nonblank;
                    accumulate(fresh, current.blank + log_p + odds);
                } else {
                    let slot = &mut candidates.entry(extended).or_default().nonblank;
                    accumulate(slot, current.total() + log_p + odds);
                }
            }
        }

        // vetoed prefixes never come back
        beams = candidates
            .drain()
            .filter(|(_, p)| p.total() > f32::NEG_INFINITY)
            .collect();
        beams.sort_by(|(pa, a), (pb, b)| by_probability(a.total(), b.total()).then_with(|| pa.cmp(pb)));
        beams.truncate(beam_width.max(1));
    }

    let mut ranked: Vec<(Vec<usize>, f32)> = beams
        .into_iter()
        .map(|(prefix, p)| {
            let score = p.total() + ln(lm.odds_end(&spell(&prefix, alphabet)));
            (prefix, score)
        })
        .collect();
    ranked.sort_by(|(pa, a), (pb, b)| by_probability(*a, *b).then_with(|| pa.cmp(pb)));
    ranked
}

/// Decodes probability matrices over the transcription vocabulary.
pub struct CtcDecoder<L = Uniform> {
    beam_width: usize,
    lm:         L,
}

impl<L: LanguageModel> CtcDecoder<L> {
    pub fn with_language_model(beam_width: usize, lm: L) -> Self {
        Self { beam_width, lm }
    }

    pub fn beam_width(&self) -> usize {
        self.beam_width
    }

    /// Decode the first `length` rows of a matrix into text.
    ///
    /// Every valid row must have one column per class.
    pub fn decode<R: AsRef<[f32]>>(&self, rows: &[R], length: usize) -> Result<String> {
        let rows = &rows[..length.min(rows.len())];
        for (i, row) in rows.iter().enumerate() {
            let width = row.as_ref().len();
            ensure!(
                width == charset::CLASSES,
                "timestep {} has {} classes, expected {}",
                i,
                width,
                charset::CLASSES
            );
        }

        let path = if self.beam_width <= 1 {
            greedy_path(rows)
        } else {
            beam_paths(rows, self.beam_width, charset::alphabet(), &self.lm)
                .into_iter()
                .next()
                .map(|(path, _)| path)
                .unwrap_or_default()
        };

        let indices: Vec<i32> = path.into_iter().map(|c| c as i32).collect();
        Ok(charset::decode(&indices))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// One row per class index, all probability on that class.
    fn one_hot(classes: &[usize]) -> Vec<Vec<f32>> {
        classes
            .iter()
            .map(|&c| {
                let mut row = vec![0.0; charset::CLASSES];
                row[c] = 1.0;
                row
            })
            .collect()
    }

    fn plain(beam_width: usize) -> CtcDecoder<Uniform> {
        CtcDecoder::with_language_model(beam_width, Uniform)
    }

    fn class_of(c: char) -> usize {
        charset::encode(&c.to_string()).unwrap()[0]
    }

    #[test]
    fn test_greedy_collapses_repeats_and_blanks() {
        let (a, b, blank) = (class_of('a'), class_of('b'), charset::BLANK);
        let rows = one_hot(&[a, a, blank, a, b, b, blank]);
        assert_eq!(plain(1).decode(&rows, rows.len()).unwrap(), "aab");
    }

    #[test]
    fn test_length_cuts_padding_rows() {
        let rows = one_hot(&[class_of('h'), class_of('i'), class_of('x')]);
        assert_eq!(plain(1).decode(&rows, 2).unwrap(), "hi");
        assert_eq!(plain(1).decode(&rows, 10).unwrap(), "hix");
    }

    #[test]
    fn test_all_blank_decodes_to_empty() {
        let rows = one_hot(&[charset::BLANK; 4]);
        assert_eq!(plain(1).decode(&rows, 4).unwrap(), "");
        assert_eq!(plain(8).decode(&rows, 4).unwrap(), "");
    }

    #[test]
    fn test_wrong_width_is_rejected() {
        let rows = vec![vec![0.5, 0.5]];
        assert!(plain(1).decode(&rows, 1).is_err());
    }

    #[test]
    fn test_beam_singleton() {
        let rows: [[f32; 3]; 1] = [[0.0, 1.0, 0.0]];
        let ranked = beam_paths(&rows, 20, &['a', 'b'], &Uniform);
        assert_eq!(ranked[0].0, vec![1]);
    }

    #[test]
    fn test_beam_merges() {
        // three paths spell "a", so it beats the more likely all-blank path
        let rows: [[f32; 3]; 2] = [[0.2, 0.0, 0.8], [0.4, 0.0, 0.6]];
        let ranked = beam_paths(&rows, 20, &['a', 'b'], &Uniform);
        assert_eq!(ranked[0].0, vec![0]);
        assert!((ranked[0].1.exp() - 0.52).abs() < 1e-6);
    }

    #[test]
    fn test_beam_matches_greedy_on_confident_input() {
        let rows = one_hot(&[class_of('o'), charset::BLANK, class_of('o'), class_of('k')]);
        let greedy = plain(1).decode(&rows, rows.len()).unwrap();
        let beam   = plain(5).decode(&rows, rows.len()).unwrap();
        assert_eq!(greedy, "ook");
        assert_eq!(beam, greedy);
    }

    #[test]
    fn test_beam_ranks_long_inputs() {
        let text = "the quick brown fox jumps over the lazy dog";
        let rest = 0.2 / (charset::CLASSES - 1) as f32;
        let row = |best: usize| {
            let mut row = vec![rest; charset::CLASSES];
            row[best] = 0.8;
            row
        };

        let mut rows = Vec::new();
        for c in text.chars() {
            rows.extend((0..12).map(|_| row(class_of(c))));
            rows.extend((0..13).map(|_| row(charset::BLANK)));
        }
        assert_eq!(rows.len(), 1075);

        let ranked = beam_paths(&rows, 4, charset::alphabet(), &Uniform);
        assert!(ranked[0].1.is_finite());
        assert!(ranked[0].1 > ranked[1].1);

        assert_eq!(plain(1).decode(&rows, rows.len()).unwrap(), text);
        assert_eq!(plain(4).decode(&rows, rows.len()).unwrap(), text);
    }

    #[test]
    fn test_language_model_vetoes_characters() {
        let rows: [[f32; 3]; 1] = [[0.3, 0.7, 0.0]];
        let lm = AllowedChars::new(['a']);
        let ranked = beam_paths(&rows, 20, &['a', 'b'], &lm);
        assert_eq!(ranked[0].0, vec![0]);
    }
}
