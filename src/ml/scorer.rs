// ============================================================
// Layer 5 — Character Error Rate
// ============================================================
// Scores decoded text against the ground truth.
//
//   levenshtein(a, b) = fewest single-character insertions,
//                       deletions and substitutions turning a into b
//
//   cer(pred, truth)  = levenshtein(pred, truth) / chars(truth)
//
// Distances are over Unicode scalar values, not bytes.
//
// Only two rows of the dynamic-programming table are kept, since
// the alignment path itself is never needed.
//
// An empty ground truth has no length to normalise by: the rate
// is 0.0 when the prediction is also empty and 1.0 otherwise.
//
// Reference: Wagner & Fischer (1974) The String-to-String Correction Problem

/// Edit distance with unit costs.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            let deletion     = previous[j + 1] + 1;
            let insertion    = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Character error rate of `pred` against `truth`.
pub fn cer(pred: &str, truth: &str) -> f64 {
    let length = truth.chars().count();
    if length == 0 {
        return if pred.is_empty() { 0.0 } else { 1.0 };
    }
    levenshtein(pred, truth) as f64 / length as f64
}

/// Mean of a set of rates, or None when there are none.
pub fn mean(rates: &[f64]) -> Option<f64> {
    if rates.is_empty() {
        None
    } else {
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    }
}
