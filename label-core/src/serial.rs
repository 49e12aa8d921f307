//! Serial sequencer: splits a scanned value into a static prefix and a
//! zero-padded numeric suffix, and derives successors preserving the width.

/// A scanned serial decomposed into `prefix + digits`.
///
/// `digits` is the longest trailing run of ASCII decimal digits; it is empty
/// when the value ends in a non-digit, in which case the serial cannot be
/// auto-incremented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialSpec {
    pub prefix: String,
    pub digits: String,
}

impl SerialSpec {
    /// Split `raw` at the start of its trailing digit run. Total over any
    /// input; the empty string parses to two empty strings.
    pub fn parse(raw: &str) -> SerialSpec {
        let split = raw
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)
            .unwrap_or(raw.len());
        SerialSpec {
            prefix: raw[..split].to_string(),
            digits: raw[split..].to_string(),
        }
    }

    /// Number of digits in the numeric suffix.
    pub fn width(&self) -> usize {
        self.digits.len()
    }

    /// Whether `successor` can advance this serial at all.
    pub fn incrementable(&self) -> bool {
        self.numeric().is_some()
    }

    fn numeric(&self) -> Option<u128> {
        self.digits.parse().ok()
    }

    /// The `offset`-th successor of this serial, zero-padded back to the
    /// original width. Padding never truncates: a value that outgrows the
    /// width keeps its extra digits ("A999" + 1 -> "A1000").
    ///
    /// Non-incrementable serials (no trailing digits, or a digit run too
    /// long for u128) are returned unchanged for any offset, as is an
    /// offset that would carry the value past `u128::MAX`.
    pub fn successor(&self, offset: u128) -> String {
        match self.numeric().and_then(|value| value.checked_add(offset)) {
            Some(value) => format!("{}{:0width$}", self.prefix, value, width = self.width()),
            None => format!("{}{}", self.prefix, self.digits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_trailing_digits() {
        let spec = SerialSpec::parse("AB007");
        assert_eq!(spec.prefix, "AB");
        assert_eq!(spec.digits, "007");
        assert_eq!(spec.width(), 3);
    }

    #[test]
    fn parse_handles_no_digits_and_empty() {
        let spec = SerialSpec::parse("SERIAL-");
        assert_eq!(spec.prefix, "SERIAL-");
        assert_eq!(spec.digits, "");

        let empty = SerialSpec::parse("");
        assert_eq!(empty.prefix, "");
        assert_eq!(empty.digits, "");
    }

    #[test]
    fn parse_all_digits_has_empty_prefix() {
        let spec = SerialSpec::parse("00042");
        assert_eq!(spec.prefix, "");
        assert_eq!(spec.digits, "00042");
    }

    #[test]
    fn parse_only_splits_the_trailing_run() {
        let spec = SerialSpec::parse("A1B23");
        assert_eq!(spec.prefix, "A1B");
        assert_eq!(spec.digits, "23");
    }

    #[test]
    fn successor_preserves_width() {
        let spec = SerialSpec::parse("AB007");
        assert_eq!(spec.successor(0), "AB007");
        assert_eq!(spec.successor(1), "AB008");
        assert_eq!(spec.successor(95), "AB102");
    }

    #[test]
    fn successor_is_monotone() {
        let spec = SerialSpec::parse("X0100");
        for k in 0..50u128 {
            let next = spec.successor(k);
            let tail: u128 = next.trim_start_matches('X').parse().unwrap();
            assert_eq!(tail, 100 + k);
        }
    }

    #[test]
    fn non_incrementable_passthrough() {
        let spec = SerialSpec::parse("NO-DIGITS-");
        for k in [0u128, 1, 7, 1000] {
            assert_eq!(spec.successor(k), "NO-DIGITS-");
        }
    }

    #[test]
    fn successor_grows_past_width() {
        // Overflowing the padded width keeps the extra digit rather than
        // wrapping or clamping.
        let spec = SerialSpec::parse("A999");
        assert_eq!(spec.successor(1), "A1000");
        let spec = SerialSpec::parse("A099");
        assert_eq!(spec.successor(2), "A101");
    }

    #[test]
    fn huge_digit_run_is_passthrough() {
        let raw = "Z99999999999999999999999999999999999999999";
        let spec = SerialSpec::parse(raw);
        assert!(!spec.incrementable());
        assert_eq!(spec.successor(1), raw);
    }

    #[test]
    fn offset_past_u128_max_is_passthrough() {
        // u128::MAX itself still parses; advancing past it must not wrap
        // or panic, just repeat the serial verbatim.
        let raw = "X340282366920938463463374607431768211455";
        let spec = SerialSpec::parse(raw);
        assert!(spec.incrementable());
        assert_eq!(spec.successor(0), raw);
        assert_eq!(spec.successor(1), raw);
        assert_eq!(spec.successor(u128::MAX), raw);
    }

    #[test]
    fn unicode_prefix_is_kept_intact() {
        let spec = SerialSpec::parse("Ünit-07");
        assert_eq!(spec.prefix, "Ünit-");
        assert_eq!(spec.successor(3), "Ünit-10");
    }
}
