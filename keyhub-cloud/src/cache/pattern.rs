//! Redis-style glob matching for `KEYS`
//!
//! Supports `*`, `?`, `[abc]`, `[a-z]`, `[^a]` and `\` escapes.

/// Whether `key` matches the glob `pattern`
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();
    matches(&pattern, &key)
}

/// True when the pattern contains no wildcard, so it names exactly one key
pub fn is_literal(pattern: &str) -> bool {
    !pattern.contains(['*', '?', '[', '\\'])
}

fn matches(p: &[char], s: &[char]) -> bool {
    match p.split_first() {
        None => s.is_empty(),
        Some(('*', _)) => {
            let rest = skip_stars(p);
            if rest.is_empty() {
                return true;
            }
            (0..=s.len()).any(|i| matches(rest, &s[i..]))
        }
        Some(('?', rest)) => !s.is_empty() && matches(rest, &s[1..]),
        Some(('[', rest)) => {
            let Some((&c, tail)) = s.split_first() else {
                return false;
            };
            let (hit, after) = match_class(rest, c);
            hit && matches(after, tail)
        }
        Some(('\\', [escaped, rest @ ..])) => s.first() == Some(escaped) && matches(rest, &s[1..]),
        Some((literal, rest)) => s.first() == Some(literal) && matches(rest, &s[1..]),
    }
}

fn skip_stars(p: &[char]) -> &[char] {
    let n = p.iter().take_while(|&&c| c == '*').count();
    &p[n..]
}

/// Match `c` against the class body following `[`. Returns whether it
/// matched and the pattern remaining after the closing `]`. An unterminated
/// class runs to the end of the pattern.
fn match_class(mut p: &[char], c: char) -> (bool, &[char]) {
    let negate = p.first() == Some(&'^');
    if negate {
        p = &p[1..];
    }

    let mut hit = false;
    loop {
        match p {
            [] => break,
            [']', rest @ ..] => {
                p = rest;
                break;
            }
            ['\\', escaped, rest @ ..] => {
                hit |= *escaped == c;
                p = rest;
            }
            [lo, '-', hi, rest @ ..] if *hi != ']' => {
                let (lo, hi) = if lo <= hi { (*lo, *hi) } else { (*hi, *lo) };
                hit |= (lo..=hi).contains(&c);
                p = rest;
            }
            [literal, rest @ ..] => {
                hit |= *literal == c;
                p = rest;
            }
        }
    }

    (hit != negate, p)
}
