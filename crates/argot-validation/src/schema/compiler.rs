// Schema tree -> Ruleset

use super::node::{SchemaNode, SchemaValue};
use super::ruleset::Ruleset;
use crate::tag::Tag;

/// Walk a schema tree and register its rules into `ruleset`.
///
/// For every key/value pair of every mapping:
///
/// 1. The key's tag becomes a key rule at the value's path. A `Pattern` key
///    registers `Optional` instead, since a wildcard can never be required.
/// 2. A tagged value registers a value rule at its own path. For `OneOf`,
///    each tagged alternative registers at the alternative's path, and each
///    untagged alternative is compiled as a nested schema.
/// 3. The value's own children are compiled regardless.
pub fn compile(node: &SchemaNode, ruleset: &mut Ruleset) {
    let SchemaValue::Mapping(entries) = &node.value else {
        return;
    };

    for (key, value) in entries {
        let key_tag = if key.is_pattern() {
            Some(Tag::Optional)
        } else {
            key.tag.clone()
        };
        ruleset.add_key_tag(value.path.clone(), key_tag);

        match (&value.tag, &value.value) {
            (Some(Tag::OneOf), SchemaValue::Sequence(alternatives)) => {
                for alternative in alternatives {
                    match &alternative.tag {
                        Some(tag) => ruleset.add_value_tag(alternative.path.clone(), tag.clone()),
                        None => compile(alternative, ruleset),
                    }
                }
            }
            (Some(tag), _) => ruleset.add_value_tag(value.path.clone(), tag.clone()),
            (None, _) => {}
        }

        compile(value, ruleset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use crate::registry::TagRegistry;
    use crate::schema::builder::parse;
    use crate::tag::TagKind;

    fn ruleset(source: &str) -> Ruleset {
        let tree = parse(source, &TagRegistry::with_defaults()).unwrap();
        let mut ruleset = Ruleset::new();
        compile(&tree, &mut ruleset);
        ruleset
    }

    fn path(dotted: &str) -> Path {
        dotted.split('.').collect()
    }

    fn kinds(tags: &[Tag]) -> Vec<TagKind> {
        tags.iter().map(Tag::kind).collect()
    }

    #[test]
    fn test_every_key_gets_an_entry() {
        let rules = ruleset("meats:\n  beef_from_usa:\n    !r grade: !t string\n");
        let paths: Vec<String> = rules.paths().map(|p| p.to_string()).collect();
        assert_eq!(
            paths,
            vec!["meats", "meats.beef_from_usa", "meats.beef_from_usa.grade"]
        );

        let meats = rules.lookup(&path("meats")).unwrap();
        assert!(meats.key.is_empty());
        assert!(meats.value.is_empty());
    }

    #[test]
    fn test_key_and_value_rules_accumulate() {
        let rules = ruleset("!r level: !rg \"1-5\"\n");
        let level = rules.lookup(&path("level")).unwrap();
        assert_eq!(kinds(&level.key), vec![TagKind::Required]);
        assert_eq!(kinds(&level.value), vec![TagKind::Range]);
    }

    #[test]
    fn test_pattern_keys_are_optional() {
        let rules = ruleset("!x \"^zone_[0-9]+$\": !t integer\n");
        let zone = rules.lookup(&path("zone_12")).unwrap();
        assert_eq!(kinds(&zone.key), vec![TagKind::Optional]);
        assert_eq!(kinds(&zone.value), vec![TagKind::Type]);
    }

    #[test]
    fn test_oneof_registers_each_alternative() {
        let rules = ruleset("id: !one [!t integer, !x \"^[a-f0-9]+$\"]\n");
        let id = rules.lookup(&path("id")).unwrap();
        assert_eq!(kinds(&id.value), vec![TagKind::Type, TagKind::Pattern]);
    }

    #[test]
    fn test_oneof_untagged_alternatives_compile_as_schemas() {
        let rules = ruleset("owner: !one [!t string, {name: !t string, !r email: !x \"@\"}]\n");
        let email = rules.lookup(&path("owner.email")).unwrap();
        assert_eq!(kinds(&email.key), vec![TagKind::Required]);
        assert!(rules.lookup(&path("owner.name")).is_some());
        assert_eq!(kinds(&rules.lookup(&path("owner")).unwrap().value), vec![TagKind::Type]);
    }

    #[test]
    fn test_non_mapping_root_compiles_to_nothing() {
        assert!(ruleset("- a\n- b\n").is_empty());
        assert!(ruleset("just a scalar").is_empty());
    }
}
