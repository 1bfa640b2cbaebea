//! Expansion of inventory host range patterns.
//!
//! `web[01:03].example.com` expands to `web01.example.com`,
//! `web02.example.com` and `web03.example.com`. A range may carry a stride
//! (`[0:10:5]`) and may be alphabetic (`[a:c]`). Several ranges in one
//! pattern expand as a cartesian product, leftmost range outermost.

use crate::error::Error;

/// Maximum number of hosts a single pattern may produce
const MAX_EXPANSION_SIZE: usize = 100_000;

pub fn expand_host_pattern(pattern: &str) -> Result<Vec<String>, Error> {
    let hosts = expand(pattern, pattern)?;
    if hosts.len() > MAX_EXPANSION_SIZE {
        return Err(invalid(
            pattern,
            format!("expands to more than {MAX_EXPANSION_SIZE} hosts"),
        ));
    }
    Ok(hosts)
}

fn expand(pattern: &str, original: &str) -> Result<Vec<String>, Error> {
    let Some(open) = pattern.find('[') else {
        return Ok(vec![pattern.to_string()]);
    };
    let close = pattern[open..]
        .find(']')
        .map(|i| open + i)
        .ok_or_else(|| invalid(original, "unclosed bracket".to_string()))?;

    let head = &pattern[..open];
    let range = &pattern[open + 1..close];
    let tail = &pattern[close + 1..];

    if !range.contains(':') {
        // Not a range; keep the brackets literally.
        return Ok(expand(tail, original)?
            .into_iter()
            .map(|rest| format!("{}{rest}", &pattern[..=close]))
            .collect());
    }

    let middles = expand_range(range, original)?;
    let tails = expand(tail, original)?;

    let mut hosts = Vec::with_capacity(middles.len() * tails.len());
    for middle in &middles {
        for rest in &tails {
            hosts.push(format!("{head}{middle}{rest}"));
        }
        if hosts.len() > MAX_EXPANSION_SIZE {
            break;
        }
    }
    Ok(hosts)
}

fn expand_range(range: &str, original: &str) -> Result<Vec<String>, Error> {
    let parts: Vec<&str> = range.split(':').collect();
    let (beg, end, step) = match parts.as_slice() {
        [beg, end] => (*beg, *end, None),
        [beg, end, step] => (*beg, *end, Some(*step)),
        _ => return Err(invalid(original, format!("bad range '[{range}]'"))),
    };

    let beg = if beg.is_empty() { "0" } else { beg };
    if end.is_empty() {
        return Err(invalid(original, "range must specify an end value".to_string()));
    }
    let step = match step {
        None | Some("") => 1,
        Some(step) => step
            .parse::<usize>()
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| invalid(original, format!("bad stride '{step}'")))?,
    };

    if let (Ok(first), Ok(last)) = (beg.parse::<u64>(), end.parse::<u64>()) {
        if first > last {
            return Err(invalid(
                original,
                format!("range start {beg} is greater than end {end}"),
            ));
        }
        let width = if beg.len() > 1 && beg.starts_with('0') {
            if beg.len() != end.len() {
                return Err(invalid(
                    original,
                    "padded range must use equal-length start and end".to_string(),
                ));
            }
            beg.len()
        } else {
            0
        };
        let count = (last - first) / step as u64 + 1;
        if count > MAX_EXPANSION_SIZE as u64 {
            return Err(invalid(
                original,
                format!("expands to more than {MAX_EXPANSION_SIZE} hosts"),
            ));
        }
        return Ok((first..=last)
            .step_by(step)
            .map(|n| format!("{n:0width$}"))
            .collect());
    }

    let (mut first, mut last) = (beg.chars(), end.chars());
    match (first.next(), first.next(), last.next(), last.next()) {
        (Some(a), None, Some(b), None) if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
            if a > b {
                return Err(invalid(
                    original,
                    format!("range start {a} is greater than end {b}"),
                ));
            }
            Ok((a..=b)
                .filter(char::is_ascii_alphabetic)
                .step_by(step)
                .map(String::from)
                .collect())
        }
        _ => Err(invalid(original, format!("bad range '[{range}]'"))),
    }
}

fn invalid(pattern: &str, reason: String) -> Error {
    Error::InvalidHostPattern {
        pattern: pattern.to_string(),
        reason,
    }
}
