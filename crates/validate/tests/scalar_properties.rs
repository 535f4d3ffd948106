//! Property tests for YAML scalar rendering.

use plugbridge_validate::frontmatter::parse_yaml_mapping;
use plugbridge_validate::{quoted_scalar, yaml_scalar};
use proptest::prelude::*;
use serde_yaml::Value;

proptest! {
    #[test]
    fn rendered_scalars_reparse_to_the_same_string(s in "\\PC{0,40}") {
        let yaml = format!("description: {}\n", yaml_scalar(&s));
        let mapping = parse_yaml_mapping(&yaml).unwrap();
        prop_assert_eq!(mapping.get("description"), Some(&Value::String(s.clone())));
    }

    #[test]
    fn quoted_scalars_survive_control_characters(s in "[a-z \\n\\t\"\\\\:#]{0,30}") {
        let yaml = format!("hint: {}\n", quoted_scalar(&s));
        let mapping = parse_yaml_mapping(&yaml).unwrap();
        prop_assert_eq!(mapping.get("hint"), Some(&Value::String(s.clone())));
    }
}
