//! Canonical phone number form: ten ASCII digits starting with `0`.

/// Reduce `raw` to a canonical phone number, or `None` if it is not one.
///
/// Every non-digit is stripped first. Ten digits with a leading `0` are kept
/// as-is; nine digits get a `0` prepended (numbers whose leading zero was lost
/// to a spreadsheet). Anything else, including numbers written with a country
/// code such as `+66 81-234-5678`, is rejected.
pub fn normalize(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 if digits.starts_with('0') => Some(digits),
        9 => Some(format!("0{digits}")),
        _ => None,
    }
}

/// `true` when `s` is already canonical.
pub fn is_canonical(s: &str) -> bool {
    s.len() == 10 && s.starts_with('0') && s.bytes().all(|b| b.is_ascii_digit())
}
