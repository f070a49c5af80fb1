//! Context matching across bracketed sub-branches.
//!
//! A prefix is read along the path from the root down to a symbol, so sibling
//! sub-branches that close before the symbol are skipped. A suffix may
//! continue into any one of the sub-branches that follow the symbol.

use super::symbol::Symbol;

/// Index of the `[` matching the `]` at `index`. Identity when `index` is
/// not on a `]`, is out of range, or the bracket is unmatched.
pub fn skip_bracket_backward(seq: &[Symbol], index: usize) -> usize {
    if index >= seq.len() || !seq[index].is_branch_close() {
        return index;
    }

    let mut depth = 0usize;
    for i in (0..=index).rev() {
        if seq[i].is_branch_close() {
            depth += 1;
        } else if seq[i].is_branch_open() {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
    }
    index
}

/// Index of the `]` matching the `[` at `index`. Identity when `index` is
/// not on a `[`, is out of range, or the bracket is unmatched.
pub fn skip_bracket_forward(seq: &[Symbol], index: usize) -> usize {
    if index >= seq.len() || !seq[index].is_branch_open() {
        return index;
    }

    let mut depth = 0usize;
    for (i, symbol) in seq.iter().enumerate().skip(index) {
        if symbol.is_branch_open() {
            depth += 1;
        } else if symbol.is_branch_close() {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
    }
    index
}

/// True when the symbols leading up to `index` along its branch path end
/// with `pattern`.
pub fn is_prefixed_by(seq: &[Symbol], index: usize, pattern: &[Symbol]) -> bool {
    if pattern.is_empty() {
        return true;
    }
    if index == 0 || index > seq.len() {
        return false;
    }

    let mut remaining = pattern.len();
    let mut cursor = index - 1;
    loop {
        let symbol = seq[cursor];
        if symbol == pattern[remaining - 1] {
            remaining -= 1;
            if remaining == 0 {
                return true;
            }
        } else if symbol.is_branch_close() {
            cursor = skip_bracket_backward(seq, cursor);
        } else if !symbol.is_branch_open() {
            return false;
        }

        if cursor == 0 {
            return false;
        }
        cursor -= 1;
    }
}

/// True when `pattern` follows `index`, either directly or by descending
/// into one of the sub-branches that start after it.
pub fn is_suffixed_by(seq: &[Symbol], index: usize, pattern: &[Symbol]) -> bool {
    if pattern.is_empty() {
        return true;
    }

    let mut cursor = index + 1;
    let mut matched = 0;
    // (branch open index, pattern progress when the branch was entered)
    let mut branch_points: Vec<(usize, usize)> = Vec::new();

    while cursor < seq.len() {
        let symbol = seq[cursor];
        if symbol == pattern[matched] {
            matched += 1;
            if matched == pattern.len() {
                return true;
            }
            cursor += 1;
        } else if symbol.is_branch_open() {
            branch_points.push((cursor, matched));
            cursor += 1;
        } else {
            let Some((open, progress)) = branch_points.pop() else {
                return false;
            };
            matched = progress;
            cursor = skip_bracket_forward(seq, open) + 1;
        }
    }
    false
}
