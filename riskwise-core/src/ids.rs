//! Identifier generation for calculations and register entries.

use rand::Rng;

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate an identifier of the form `risk_<unix-millis>_<9 base-36 chars>`.
///
/// Not cryptographically unique; collisions need the same millisecond and
/// the same 46-bit random suffix.
pub fn generate_risk_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("risk_{millis}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_shape() {
        let id = generate_risk_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "risk");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_ids_are_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_risk_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
