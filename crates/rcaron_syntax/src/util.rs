pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut cur = vec![0; b_chars.len() + 1];
    for (i, ac) in a_chars.iter().enumerate() {
        cur[0] = i + 1;
        for (j, bc) in b_chars.iter().enumerate() {
            let cost = usize::from(!ac.eq_ignore_ascii_case(bc));
            cur[j + 1] = (prev[j + 1] + 1).min(cur[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b_chars.len()]
}

/// Closest candidate within half the name's length, used for "did you mean" hints.
pub fn find_best_match<'a>(
    name: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Option<&'a str> {
    let mut best_match = None;
    let mut min_distance = (name.chars().count() / 2).max(1);

    for candidate in candidates {
        let distance = levenshtein_distance(name, candidate);
        if distance <= min_distance {
            min_distance = distance;
            best_match = Some(candidate);
        }
    }

    best_match
}

/// Characters allowed after the `$` sigil.
pub fn is_variable_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

pub fn is_keyword_start(c: char) -> bool {
    c == '_' || c == '`' || c.is_alphabetic()
}

pub fn is_keyword_continue(c: char) -> bool {
    c == '_' || c == '-' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_match_is_case_insensitive() {
        let names = ["Print", "Range", "Assert"];
        assert_eq!(find_best_match("prnt", names.iter().copied()), Some("Print"));
        assert_eq!(find_best_match("zzzzzz", names.iter().copied()), None);
    }
}
