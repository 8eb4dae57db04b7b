//! Reversible encoding of question names for flat prompt namespaces.
//!
//! Some prompt front-ends treat `.` in a question name as a nested path.
//! Names are encoded before prompting and every returned key is restored
//! before the answers are interpreted.

use std::collections::BTreeMap;

use crate::errors::WizardError;

pub const RESTRICTED: char = '.';
pub const SENTINEL: &str = "--DOT--";

pub fn encode(key: &str) -> String {
    key.replace(RESTRICTED, SENTINEL)
}

pub fn decode(safe_key: &str) -> String {
    safe_key.replace(SENTINEL, &RESTRICTED.to_string())
}

pub fn is_encoded(key: &str) -> bool {
    key.contains(SENTINEL)
}

/// Decode every encoded key in place. Fails instead of overwriting when the
/// decoded name is already present.
pub fn restore<V>(answers: &mut BTreeMap<String, V>) -> Result<(), WizardError> {
    let encoded: Vec<String> = answers.keys().filter(|k| is_encoded(k)).cloned().collect();
    for key in encoded {
        let decoded = decode(&key);
        if answers.contains_key(&decoded) {
            return Err(WizardError::KeyCollision(decoded));
        }
        if let Some(value) = answers.remove(&key) {
            answers.insert(decoded, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_with_dots() {
        for id in ["npm:ms:20170412|debug@2.2.0 > ms@0.7.1", "a.b.c", "...", "plain"] {
            assert_eq!(decode(&encode(id)), id);
        }
    }

    #[test]
    fn test_encoded_has_no_restricted_char() {
        let safe = encode("lodash@4.17.4");
        assert!(!safe.contains('.'));
        assert!(is_encoded(&safe));
        assert!(!is_encoded("lodash"));
    }

    #[test]
    fn test_restore_renames_keys() {
        let mut answers = BTreeMap::new();
        answers.insert(encode("a@1.0.0"), 1);
        answers.insert("misc-add-test".to_string(), 2);
        restore(&mut answers).unwrap();
        assert_eq!(answers.get("a@1.0.0"), Some(&1));
        assert_eq!(answers.get("misc-add-test"), Some(&2));
        assert!(answers.keys().all(|k| !is_encoded(k)));
    }

    #[test]
    fn test_restore_detects_collision() {
        let mut answers = BTreeMap::new();
        answers.insert(encode("a@1.0.0"), 1);
        answers.insert("a@1.0.0".to_string(), 2);
        let err = restore(&mut answers).unwrap_err();
        assert!(matches!(err, WizardError::KeyCollision(k) if k == "a@1.0.0"));
        assert_eq!(answers.get("a@1.0.0"), Some(&2));
    }
}
