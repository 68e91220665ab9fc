#[cfg(test)]
mod tests {
    use rebody::http::params::{MultiMap, ParamValue};

    // ---------- add / value ----------
    #[test]
    fn test_add_and_first_value() {
        let mut map = MultiMap::new();
        map.add("a", "1");
        map.add("a", "2");

        assert_eq!(map.value("a").and_then(ParamValue::as_text), Some("1"));
        assert!(map.value("missing").is_none());
    }

    // ---------- values keep insertion order ----------
    #[test]
    fn test_values_order() {
        let mut map = MultiMap::new();
        map.add("tags", "programming");
        map.add("other", "x");
        map.add("tags", "backend");

        let tags: Vec<&str> = map
            .values("tags")
            .iter()
            .filter_map(ParamValue::as_text)
            .collect();
        assert_eq!(tags, vec!["programming", "backend"]);
        assert!(map.values("missing").is_empty());
    }

    // ---------- keys keep first-insertion order ----------
    #[test]
    fn test_keys_order() {
        let mut map = MultiMap::new();
        map.add("b", "1");
        map.add("a", "2");
        map.add("b", "3");
        map.add("c", "4");

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(map.len(), 3);
        // repeated enumeration is stable
        assert_eq!(map.keys().collect::<Vec<_>>(), keys);
    }

    // ---------- empty key is still a key ----------
    #[test]
    fn test_empty_key() {
        let mut map = MultiMap::new();
        map.add("", "orphan");

        assert!(map.contains_key(""));
        assert_eq!(map.value("").map(ToString::to_string), Some("orphan".to_string()));
    }

    // ---------- as_map snapshot ----------
    #[test]
    fn test_as_map() {
        let mut map = MultiMap::new();
        map.add("x", "1");
        map.add("y", String::from("2"));
        map.add("x", "3");

        let snapshot = map.as_map();
        assert_eq!(
            snapshot,
            vec![
                ("x".to_string(), vec!["1".to_string(), "3".to_string()]),
                ("y".to_string(), vec!["2".to_string()]),
            ]
        );

        // snapshot is detached from later additions
        map.add("z", "4");
        assert_eq!(snapshot.len(), 2);
    }

    // ---------- serialize keeps order ----------
    #[test]
    fn test_serialize_ordered() {
        let mut map = MultiMap::new();
        map.add("b", "1");
        map.add("a", "2");
        map.add("a", "3");

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"b":["1"],"a":["2","3"]}"#);
    }

    #[test]
    fn test_empty_map() {
        let map = MultiMap::new();
        assert!(map.is_empty());
        assert!(map.as_map().is_empty());
        assert_eq!(map.iter().count(), 0);
    }
}
