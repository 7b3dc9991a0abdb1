//! Integration test: JSON and YAML documents in and out of declared types.

use std::io::Write;

use proptest::prelude::*;
use serde_json::json;

use sdom_object::{FromPlainData, ObjectType, PrimitiveKind, PropertyBuilder, ToPlainData};

fn crew() -> (ObjectType, ObjectType) {
    let member = ObjectType::builder("plain_data.Member")
        .property(PropertyBuilder::new("name", "str"))
        .property(PropertyBuilder::new("age", PrimitiveKind::Int).optional(true))
        .build()
        .unwrap();
    let crew = ObjectType::builder("plain_data.Crew")
        .property(PropertyBuilder::new("ship", "str"))
        .property(PropertyBuilder::list("members", &member))
        .property(
            PropertyBuilder::dict("ranks", "str").key_pattern("^[a-z]+$").default(json!({})),
        )
        .build()
        .unwrap();
    (member, crew)
}

const CREW_YAML: &str = "\
ship: Nostromo
members:
  - name: Ripley
    age: 32
  - name: Ash
ranks:
  ripley: warrant officer
";

#[test]
fn test_yaml_file_round_trip() {
    let (member, crew) = crew();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CREW_YAML.as_bytes()).unwrap();

    let nostromo = crew.from_yaml_file(file.path()).unwrap();
    assert_eq!(nostromo.get_plain("ship").unwrap(), json!("Nostromo"));
    let members = nostromo.get_list("members").unwrap().unwrap();
    assert_eq!(members.len(), 2);
    let ash = sdom_object::UserObject::from_element(&members.get(1).unwrap()).unwrap();
    assert!(ash.object_type().ptr_eq(&member));
    assert!(ash.get("age").unwrap().is_none());

    let yaml = nostromo.to_yaml().unwrap();
    let again = crew.from_yaml(&yaml).unwrap();
    assert_eq!(again, nostromo);
}

#[test]
fn test_json_file_round_trip() {
    let (_member, crew) = crew();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crew.json");
    let source = json!({
        "ship": "Sulaco",
        "members": [{"name": "Hicks", "age": 30}],
    });
    std::fs::write(&path, serde_json::to_string_pretty(&source).unwrap()).unwrap();

    let sulaco = crew.from_json_file(&path).unwrap();
    assert_eq!(sulaco.to_json().unwrap(), serde_json::to_string(&source).unwrap());

    let pretty = sulaco.to_json_pretty().unwrap();
    assert!(pretty.contains('\n'));
    assert_eq!(crew.from_json(&pretty).unwrap(), sulaco);
}

#[test]
fn test_invalid_document_is_rejected() {
    let (_member, crew) = crew();
    let err = crew
        .from_yaml("ship: Sevastopol\nmembers: []\nranks:\n  Amanda: engineer\n")
        .unwrap_err();
    assert!(err.is_value());

    let err = crew.from_json("{\"ship\": \"Sevastopol\"}").unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_elements_serialize_directly() {
    let (_member, crew) = crew();
    let nostromo = crew.from_yaml(CREW_YAML).unwrap();
    let members = nostromo.get_list("members").unwrap().unwrap();
    assert_eq!(
        members.to_json().unwrap(),
        r#"[{"name":"Ripley","age":32},{"name":"Ash"}]"#
    );
    let ranks = nostromo.get_dict("ranks").unwrap().unwrap();
    assert_eq!(ranks.to_yaml().unwrap(), "ripley: warrant officer\n");
}

fn names() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ]{0,15}"
}

prop_compose! {
    fn crews()(
        ship in names(),
        members in prop::collection::vec((names(), prop::option::of(0i64..120)), 0..6),
        ranks in prop::collection::btree_map("[a-z]{1,8}", names(), 0..4),
    ) -> serde_json::Value {
        let members: Vec<serde_json::Value> = members
            .into_iter()
            .map(|(name, age)| match age {
                Some(age) => json!({"name": name, "age": age}),
                None => json!({"name": name}),
            })
            .collect();
        json!({"ship": ship, "members": members, "ranks": ranks})
    }
}

proptest! {
    #[test]
    fn test_round_trip_through_text(value in crews()) {
        let (_member, crew) = crew();
        let first = crew.accept(value.clone()).unwrap();
        prop_assert_eq!(first.to_plain(), value);

        let from_json = crew.from_json(&first.to_json().unwrap()).unwrap();
        prop_assert_eq!(&from_json, &first);
        let from_yaml = crew.from_yaml(&first.to_yaml().unwrap()).unwrap();
        prop_assert_eq!(&from_yaml, &first);
    }
}
