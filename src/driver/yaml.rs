//! YAML document decoding

use serde::de::DeserializeOwned;

use crate::common::Result;

/// Decode a YAML document into `T`
pub fn read_yaml<T: DeserializeOwned>(input: &str) -> Result<T> {
    Ok(serde_yaml::from_str(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Deserialize, Debug, PartialEq)]
    struct Cluster {
        name: String,
        connect_timeout: String,
    }

    #[test]
    fn test_read_typed() {
        let cluster: Cluster = read_yaml("name: backend\nconnect_timeout: 5s\n").unwrap();
        assert_eq!(
            cluster,
            Cluster {
                name: "backend".to_string(),
                connect_timeout: "5s".to_string()
            }
        );
    }

    #[test]
    fn test_read_as_json_value() {
        let value: Value = read_yaml("listeners:\n- name: inbound\n  port: 80\n").unwrap();
        assert_eq!(value, json!({"listeners": [{"name": "inbound", "port": 80}]}));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = read_yaml::<Value>("a: [1, 2").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }
}
