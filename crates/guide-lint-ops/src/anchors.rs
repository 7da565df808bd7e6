use percent_encoding::percent_decode_str;
use strsim::normalized_levenshtein;

const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Normalise anchor fragments by decoding percent-encoding, trimming, and lowercasing.
pub fn normalize_anchor_fragment(fragment: &str) -> String {
    percent_decode_str(fragment)
        .decode_utf8_lossy()
        .trim()
        .to_lowercase()
}

/// Closest known slug to `missing`, if any is similar enough to be worth suggesting.
pub fn suggest_anchor<'a, I>(missing: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(|candidate| (candidate, normalized_levenshtein(missing, candidate)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(slug, _)| slug)
}
