/// Implements sign extension as described at [Sign extension](https://en.wikipedia.org/wiki/Sign_extension).
///
/// Only the lowest `valid_bits` of `bits` are looked at, everything above is replaced by
/// copies of the most significant valid bit.
#[must_use]
pub const fn sign_extend(bits: u16, valid_bits: u8) -> u16 {
    debug_assert!(valid_bits > 0 && valid_bits <= 16);
    if valid_bits >= 16 {
        return bits;
    }
    let bits = bits & ((1 << valid_bits) - 1);
    let most_significant_bit = (bits >> (valid_bits - 1)) & 1;
    if most_significant_bit == 1 {
        // negative: 1-extend
        bits | (0xFFFF << valid_bits)
    } else {
        // positive, already 0-extended
        bits
    }
}

#[must_use]
pub const fn twos_complement_to_decimal(bin_rep: u16) -> i16 {
    bin_rep.cast_signed()
}

#[must_use]
pub const fn decimal_to_twos_complement(value: i16) -> u16 {
    value.cast_unsigned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use proptest::prelude::*;
    use yare::parameterized;

    #[parameterized(
        imm5_positive = { 0b0_1110, 5, 14 },
        imm5_negative = { 0b1_1110, 5, 0xFFFE },
        offset6_min = { 0b10_0000, 6, 0xFFE0 },
        offset9_max = { 0b0_1111_1111, 9, 0x00FF },
        offset9_minus_one = { 0b1_1111_1111, 9, 0xFFFF },
        offset11_negative = { 0b100_0000_0000, 11, 0xFC00 },
        ignores_upper_bits = { 0b1111_0000_0000_0001, 5, 1 },
        full_width = { 0x8000, 16, 0x8000 },
    )]
    fn test_sign_extend(bits: u16, valid_bits: u8, expected: u16) {
        assert_eq!(sign_extend(bits, valid_bits), expected);
    }

    #[gtest]
    fn test_twos_complement() {
        expect_that!(twos_complement_to_decimal(0xFFFF), eq(-1));
        expect_that!(twos_complement_to_decimal(0x8000), eq(i16::MIN));
        expect_that!(twos_complement_to_decimal(0x7FFF), eq(i16::MAX));
        expect_that!(decimal_to_twos_complement(-10), eq(0b1111_1111_1111_0110));
    }

    proptest! {
        #[test]
        fn sign_extend_is_idempotent(v: u16, bits in prop::sample::select(vec![5u8, 6, 9, 11])) {
            let once = sign_extend(v, bits);
            prop_assert_eq!(sign_extend(once, bits), once);
        }

        #[test]
        fn sign_extend_preserves_value(v in -16i16..16) {
            let narrow = decimal_to_twos_complement(v) & 0b1_1111;
            prop_assert_eq!(twos_complement_to_decimal(sign_extend(narrow, 5)), v);
        }
    }
}
