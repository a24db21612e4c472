const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [&str; 12] = [
    "", "thousand", "million", "billion", "trillion", "quadrillion", "quintillion",
    "sextillion", "septillion", "octillion", "nonillion", "decillion",
];

/// Digits with optional `,` grouping and an optional `.` fraction.
pub(crate) fn is_numeral(token: &str) -> bool {
    let (int_part, frac_part) = match token.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (token, None),
    };

    let int_ok = int_part.starts_with(|c: char| c.is_ascii_digit())
        && !int_part.ends_with(',')
        && !int_part.contains(",,")
        && int_part.chars().all(|c| c.is_ascii_digit() || c == ',');

    let frac_ok = match frac_part {
        None => true,
        Some(f) => !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()),
    };

    int_ok && frac_ok
}

pub(crate) fn spell(token: &str) -> Option<String> {
    if !is_numeral(token) {
        return None;
    }
    let (int_part, frac_part) = match token.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (token, None),
    };
    let digits: String = int_part.chars().filter(char::is_ascii_digit).collect();

    let mut out = spell_integer(&digits);
    if let Some(frac) = frac_part {
        out.push_str(" point");
        for d in frac.bytes() {
            out.push(' ');
            out.push_str(ONES[(d - b'0') as usize]);
        }
    }
    Some(out)
}

fn spell_integer(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return ONES[0].to_string();
    }
    if trimmed.len() > SCALES.len() * 3 {
        return trimmed
            .bytes()
            .map(|d| ONES[(d - b'0') as usize])
            .collect::<Vec<_>>()
            .join(" ");
    }

    // Three-digit groups, most significant first.
    let bytes = trimmed.as_bytes();
    let head = bytes.len() % 3;
    let mut groups: Vec<u16> = Vec::new();
    if head > 0 {
        groups.push(group_value(&bytes[..head]));
    }
    for chunk in bytes[head..].chunks(3) {
        groups.push(group_value(chunk));
    }

    let last = groups.len() - 1;
    let mut parts: Vec<String> = Vec::new();
    for (i, &value) in groups.iter().enumerate() {
        if value == 0 {
            continue;
        }
        // "one thousand and five": a trailing group under a hundred gets "and"
        if i == last && last > 0 && value < 100 {
            parts.push("and".to_string());
        }
        parts.push(spell_hundreds(value));
        let scale = SCALES[last - i];
        if !scale.is_empty() {
            parts.push(scale.to_string());
        }
    }
    parts.join(" ")
}

fn group_value(digits: &[u8]) -> u16 {
    digits.iter().fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'))
}

fn spell_hundreds(n: u16) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    let mut parts: Vec<String> = Vec::new();
    if hundreds > 0 {
        parts.push(format!("{} hundred", ONES[hundreds as usize]));
    }
    if rest > 0 {
        if hundreds > 0 {
            parts.push("and".to_string());
        }
        parts.push(spell_tens(rest));
    }
    parts.join(" ")
}

fn spell_tens(n: u16) -> String {
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    let unit = n % 10;
    if unit == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{}-{}", TENS[(n / 10) as usize], ONES[unit as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_plain_and_grouped_numbers() {
        assert!(is_numeral("2"));
        assert!(is_numeral("1,000"));
        assert!(is_numeral("3.14"));
        assert!(!is_numeral("2nd"));
        assert!(!is_numeral("1.2.3"));
        assert!(!is_numeral("3."));
        assert!(!is_numeral(",5"));
        assert!(!is_numeral("two"));
    }

    #[test]
    fn small_numbers() {
        assert_eq!(spell("0").as_deref(), Some("zero"));
        assert_eq!(spell("2").as_deref(), Some("two"));
        assert_eq!(spell("13").as_deref(), Some("thirteen"));
        assert_eq!(spell("40").as_deref(), Some("forty"));
        assert_eq!(spell("21").as_deref(), Some("twenty-one"));
    }

    #[test]
    fn hundreds_and_scales() {
        assert_eq!(spell("123").as_deref(), Some("one hundred and twenty-three"));
        assert_eq!(spell("1,000").as_deref(), Some("one thousand"));
        assert_eq!(spell("1005").as_deref(), Some("one thousand and five"));
        assert_eq!(
            spell("2,500,017").as_deref(),
            Some("two million five hundred thousand and seventeen")
        );
    }

    #[test]
    fn decimals_are_read_digit_by_digit() {
        assert_eq!(spell("3.14").as_deref(), Some("three point one four"));
    }

    #[test]
    fn leading_zeros_are_ignored() {
        assert_eq!(spell("007").as_deref(), Some("seven"));
    }

    #[test]
    fn huge_numbers_fall_back_to_digits() {
        let big = "1".repeat(40);
        let words = spell(&big).unwrap();
        assert_eq!(words.split(' ').count(), 40);
        assert!(words.split(' ').all(|w| w == "one"));
    }
}
