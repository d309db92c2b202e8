use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::marker::PhantomData;

/// Deserialize a field that can be either a single item or a vector of items.
///
/// `null` and blank strings (empty XML elements) become an empty vector.
pub fn single_or_vec<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    struct SingleOrVec<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for SingleOrVec<T>
    where
        T: Deserialize<'de>,
    {
        type Value = Vec<T>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("single item or array of items")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            let item = T::deserialize(de::value::MapAccessDeserializer::new(map))?;
            Ok(vec![item])
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.trim().is_empty() {
                return Ok(Vec::new());
            }
            let item = T::deserialize(de::value::StrDeserializer::<E>::new(v))?;
            Ok(vec![item])
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(SingleOrVec(PhantomData))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

/// Counts arrive as `"12"` from JSON and always as text from XML
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Optional text that may be sent as a number or wrapped as `{"content": ...}`.
/// Blank values become `None`, arrays are joined line by line.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(&serde_json::Value::deserialize(deserializer)?))
}

pub fn text_of(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("content").and_then(text_of),
        Value::Array(items) => {
            let lines: Vec<String> = items.iter().filter_map(text_of).collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        Value::Bool(_) | Value::Null => None,
    }
}

/// Required identifier that may be sent as a number
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n.to_string()),
        NumberOrString::Text(s) => Ok(s.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Container {
        #[serde(default, deserialize_with = "single_or_vec")]
        items: Vec<Item>,
    }

    #[derive(Debug, Deserialize)]
    struct Counts {
        #[serde(default, deserialize_with = "lenient_u32")]
        total: Option<u32>,
        #[serde(default, deserialize_with = "lenient_string")]
        number: Option<String>,
        #[serde(deserialize_with = "string_or_number")]
        id: String,
    }

    #[test]
    fn test_single_item() {
        let json = r#"{"items": {"id": "1", "name": "Item 1"}}"#;
        let container: Container = serde_json::from_str(json).unwrap();
        assert_eq!(container.items.len(), 1);
        assert_eq!(container.items[0].id, "1");
    }

    #[test]
    fn test_multiple_items() {
        let json = r#"{"items": [{"id": "1", "name": "Item 1"}, {"id": "2", "name": "Item 2"}]}"#;
        let container: Container = serde_json::from_str(json).unwrap();
        assert_eq!(container.items.len(), 2);
        assert_eq!(container.items[1].id, "2");
    }

    #[test]
    fn test_null_blank_and_missing_lists() {
        for json in [r#"{"items": null}"#, r#"{"items": ""}"#, r#"{}"#] {
            let container: Container = serde_json::from_str(json).unwrap();
            assert!(container.items.is_empty(), "input: {}", json);
        }
    }

    #[test]
    fn test_single_string_becomes_vec() {
        #[derive(Deserialize)]
        struct Lines {
            #[serde(deserialize_with = "single_or_vec")]
            lines: Vec<String>,
        }
        let lines: Lines = serde_json::from_str(r#"{"lines": "제1조"}"#).unwrap();
        assert_eq!(lines.lines, vec!["제1조".to_string()]);
    }

    #[test]
    fn test_lenient_numbers() {
        let counts: Counts =
            serde_json::from_str(r#"{"total": "42", "number": 17, "id": 1001}"#).unwrap();
        assert_eq!(counts.total, Some(42));
        assert_eq!(counts.number.as_deref(), Some("17"));
        assert_eq!(counts.id, "1001");

        let counts: Counts =
            serde_json::from_str(r#"{"total": 7, "number": " ", "id": "A1"}"#).unwrap();
        assert_eq!(counts.total, Some(7));
        assert_eq!(counts.number, None);
        assert_eq!(counts.id, "A1");

        let counts: Counts = serde_json::from_str(r#"{"total": "n/a", "id": "x"}"#).unwrap();
        assert_eq!(counts.total, None);
    }

    #[test]
    fn test_text_of_wrapped_values() {
        let wrapped: Counts =
            serde_json::from_str(r#"{"number": {"content": "법률", "법종구분코드": "A0002"}, "id": "1"}"#)
                .unwrap();
        assert_eq!(wrapped.number.as_deref(), Some("법률"));

        let lines = serde_json::json!(["제1조", " ", "제2조"]);
        assert_eq!(text_of(&lines).as_deref(), Some("제1조\n제2조"));
    }
}
