//! Assembly identifier generation

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

/// Turn a free-form tracker name into an assembly-safe identifier.
///
/// Every non-alphanumeric byte becomes `_`, a leading digit gets a `_`
/// prefix and the result is lowercased.
pub fn asm_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for (i, c) in name.chars().enumerate() {
        match c {
            'a'..='z' | 'A'..='Z' | '_' => out.push(c.to_ascii_lowercase()),
            '0'..='9' => {
                if i == 0 {
                    out.push('_');
                }
                out.push(c);
            }
            _ => out.push('_'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_non_alphanumerics() {
        assert_eq!(asm_identifier("Bass Drum (low)"), "bass_drum__low_");
        assert_eq!(asm_identifier("snare!"), "snare_");
    }

    #[test]
    fn escapes_leading_digit() {
        assert_eq!(asm_identifier("808 tom"), "_808_tom");
        assert_eq!(asm_identifier("a808"), "a808");
    }

    #[test]
    fn lowercases() {
        assert_eq!(asm_identifier("LOUD_Hat"), "loud_hat");
    }

    #[test]
    fn empty_name_stays_empty() {
        assert_eq!(asm_identifier(""), "");
    }
}
