//! Progressive input masks for Brazilian documents and phone numbers.
//!
//! Masks apply as the user types: separators appear once the digit after
//! them exists. Input longer than the mask is returned unchanged.

/// Keep ASCII digits only.
#[must_use]
pub fn strip_formatting(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Insert `sep` before digit index `at` for each `(at, sep)` reached.
fn mask(digits: &str, separators: &[(usize, char)]) -> String {
    let mut out = String::with_capacity(digits.len() + separators.len());
    for (i, c) in digits.chars().enumerate() {
        if let Some((_, sep)) = separators.iter().find(|(at, _)| *at == i) {
            out.push(*sep);
        }
        out.push(c);
    }
    out
}

/// `XX.XXX.XXX/XXXX-XX`
#[must_use]
pub fn format_cnpj(value: &str) -> String {
    let digits = strip_formatting(value);
    if digits.len() > 14 {
        return value.to_owned();
    }
    mask(&digits, &[(2, '.'), (5, '.'), (8, '/'), (12, '-')])
}

/// `XXX.XXX.XXX-XX`
#[must_use]
pub fn format_cpf(value: &str) -> String {
    let digits = strip_formatting(value);
    if digits.len() > 11 {
        return value.to_owned();
    }
    mask(&digits, &[(3, '.'), (6, '.'), (9, '-')])
}

/// `(XX) XXXXX-XXXX` for mobiles, `(XX) XXXX-XXXX` for landlines.
#[must_use]
pub fn format_phone(value: &str) -> String {
    let digits = strip_formatting(value);
    let (area, rest) = digits.split_at(digits.len().min(2));
    match digits.len() {
        0 => value.to_owned(),
        11 => format!("({area}) {}-{}", &rest[..5], &rest[5..]),
        10 => format!("({area}) {}-{}", &rest[..4], &rest[4..]),
        n if n > 11 => value.to_owned(),
        n if n > 6 => {
            let (middle, tail) = rest.split_at(5);
            format!("({area}) {middle}-{tail}")
        }
        n if n > 2 => format!("({area}) {rest}"),
        _ => format!("({area}"),
    }
}

#[cfg(test)]
#[path = "formatting_test.rs"]
mod tests;
