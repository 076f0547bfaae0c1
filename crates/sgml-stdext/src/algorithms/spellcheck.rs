//! Finding close words
//!
//! [find_close_words] ranks the words of a dictionary by their
//!     [Levenshtein distance](https://en.wikipedia.org/wiki/Levenshtein_distance)
//!     from a search word.
//! It is used for "did you mean" notes in diagnostics, where dictionaries
//!     are small, so the distance is computed with the plain two-row dynamic
//!     programming method.

/// Levenshtein distance between two strings, counted in Unicode scalar values.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    // previous[j] is the distance between a[..i] and b[..j].
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, a_i) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_j) in b.iter().enumerate() {
            current[j + 1] = if a_i == b_j {
                previous[j]
            } else {
                1 + previous[j].min(previous[j + 1]).min(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// A dictionary word and its distance from the search word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseWord {
    pub word: String,
    pub distance: usize,
}

/// Find words in the dictionary that are close to `word`.
///
/// Words further than `max_distance` away are dropped.
/// The result is ordered by distance, closest first; words at the same
///     distance keep their dictionary order.
pub fn find_close_words<S: AsRef<str>>(
    dictionary: &[S],
    word: &str,
    max_distance: usize,
) -> Vec<CloseWord> {
    let mut close: Vec<CloseWord> = dictionary
        .iter()
        .map(|candidate| CloseWord {
            word: candidate.as_ref().to_string(),
            distance: distance(word, candidate.as_ref()),
        })
        .filter(|c| c.distance <= max_distance)
        .collect();
    close.sort_by_key(|c| c.distance);
    close
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! distance_tests {
        ($( ($name: ident, $a: expr, $b: expr, $d: expr), )+) => {
            $(
            #[test]
            fn $name() {
                assert_eq![distance($a, $b), $d];
                assert_eq![distance($b, $a), $d];
            }
            )+
        };
    }

    distance_tests![
        (empty, "", "", 0),
        (add_one, "a", "", 1),
        (same, "a", "a", 0),
        (modify, "a", "b", 1),
        (subtract, "aa", "a", 1),
        (insert_middle, "abb", "acbb", 1),
        (all_different, "james", "laura", 4),
        (two_edits, "ab12345e", "a12345de", 2),
    ];

    #[test]
    fn find_close_words_orders_by_distance() {
        let dictionary = ["chap", "chapter", "section", "chapt"];
        let result = find_close_words(&dictionary, "chapte", 2);
        let words: Vec<&str> = result.iter().map(|c| c.word.as_str()).collect();
        assert_eq![words, vec!["chapter", "chapt", "chap"]];
    }
}
