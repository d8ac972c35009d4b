/// djb2 string hash with ECMAScript number semantics.
///
/// The shift is applied to the ToInt32 image of the running value while the
/// addition stays in double precision, so palette assignments agree with the
/// hosted style's client-side coloring.
pub fn djb2(input: &str) -> f64 {
    let mut hash: f64 = 5381.0;
    for unit in input.encode_utf16() {
        let shifted = to_int32(hash).wrapping_shl(5) as f64;
        hash = shifted + hash + unit as f64;
    }
    hash.abs()
}

/// Stable palette slot for `input`. Returns 0 for an empty palette.
pub fn palette_index(input: &str, palette_len: usize) -> usize {
    if palette_len == 0 {
        return 0;
    }
    (djb2(input) % palette_len as f64) as usize
}

fn to_int32(v: f64) -> i32 {
    if !v.is_finite() {
        return 0;
    }
    let m = v.trunc().rem_euclid(4_294_967_296.0);
    (m as u32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(djb2(""), 5381.0);
        assert_eq!(djb2("a"), 177_670.0);
        assert_eq!(palette_index("", 8), 5);
        assert_eq!(palette_index("a", 8), 6);
    }

    #[test]
    fn index_is_stable_and_in_range() {
        for name in ["Appalachian Trail", "route", "Долина", "🥾 loop"] {
            let a = palette_index(name, 8);
            let b = palette_index(name, 8);
            assert_eq!(a, b);
            assert!(a < 8);
        }
        assert_eq!(palette_index("anything", 0), 0);
    }

    #[test]
    fn long_inputs_stay_finite() {
        let s = "x".repeat(10_000);
        assert!(djb2(&s).is_finite());
    }
}
