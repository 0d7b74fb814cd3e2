use std::collections::BTreeSet;

use chatrelay_core::protocol::Value;

/// Current participants, minus administrative observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    ids: BTreeSet<String>,
}

impl Roster {
    /// Build a roster from a `CLIENT_LIST` value.
    ///
    /// Accepts a JSON array record or a text value holding a JSON array.
    /// Non-string items are skipped; anything else yields an empty roster.
    pub fn from_value(value: &Value, observer_prefix: &str) -> Self {
        let parsed;
        let items = match value {
            Value::Record(serde_json::Value::Array(items)) => items,
            Value::Text(s) => {
                parsed = serde_json::from_str::<Vec<serde_json::Value>>(s).unwrap_or_default();
                &parsed
            }
            Value::Record(_) => return Self::default(),
        };

        let ids = items
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|name| !is_observer(name, observer_prefix))
            .map(str::to_string)
            .collect();
        Self { ids }
    }

    /// Sorted ids.
    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Case-insensitive prefix match against the observer's own id.
pub fn is_observer(name: &str, observer_prefix: &str) -> bool {
    name.len() >= observer_prefix.len()
        && name
            .get(..observer_prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(observer_prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observers_are_filtered_case_insensitively() {
        let v = Value::Record(serde_json::json!(["alice", "admin", "Admin-2", "ADMIN", "bob", 7]));
        let r = Roster::from_value(&v, "ADMIN");
        assert_eq!(r.to_vec(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn text_array_is_accepted() {
        let r = Roster::from_value(&Value::Text(r#"["zed","amy"]"#.into()), "ADMIN");
        assert_eq!(r.to_vec(), vec!["amy".to_string(), "zed".to_string()]);
    }

    #[test]
    fn garbage_gives_empty_roster() {
        assert!(Roster::from_value(&Value::Text("nope".into()), "ADMIN").is_empty());
        assert!(Roster::from_value(&Value::Record(serde_json::json!({"a": 1})), "ADMIN").is_empty());
    }

    #[test]
    fn prefix_match_handles_multibyte_names() {
        assert!(!is_observer("é", "ADMIN"));
        assert!(!is_observer("adm", "ADMIN"));
        assert!(is_observer("adminé", "ADMIN"));
    }
}
