//! Instances of declared object types.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use sdom_core::DomError;
use sdom_schema::{DictElement, DomInfo, Element, ListElement, ObjectElement};

use crate::object_type::{ObjectType, TypeDecl};
use crate::property::AttributeBinding;

/// An object element paired with the declared type that built it.
///
/// Cloning shares the element. Attribute access goes through the type's
/// bindings, so defaults and storage keys apply.
#[derive(Clone)]
pub struct UserObject {
    object_type: ObjectType,
    element: ObjectElement,
}

impl UserObject {
    pub(crate) fn new(object_type: ObjectType, element: ObjectElement) -> Self {
        Self {
            object_type,
            element,
        }
    }

    /// Recover the instance behind `element` from the declared-type tag on
    /// its schema. `None` for anything not built by a declared type.
    pub fn from_element(element: &Element) -> Option<UserObject> {
        let object = element.as_object()?;
        let declared = object.object_type()?;
        let decl = declared.into_any().downcast::<TypeDecl>().ok()?;
        Some(Self::new(ObjectType(decl), object.clone()))
    }

    /// The declared type.
    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    /// The underlying object element.
    pub fn element(&self) -> &ObjectElement {
        &self.element
    }

    /// The underlying element as a generic tree node.
    pub fn as_element(&self) -> Element {
        Element::Object(self.element.clone())
    }

    /// Whether this object's type is `object_type` or one of its subtypes.
    pub fn is_instance_of(&self, object_type: &ObjectType) -> bool {
        self.object_type.is_subtype_of(object_type)
    }

    /// Value of attribute `name`, with defaults applied.
    ///
    /// # Errors
    ///
    /// `KeyError::UnknownAttribute`, or whatever computing the default
    /// raises.
    pub fn get(&self, name: &str) -> Result<Option<Element>, DomError> {
        self.object_type.binding(name)?.read(self)
    }

    /// Attribute `name` as a declared-type instance.
    pub fn get_object(&self, name: &str) -> Result<Option<UserObject>, DomError> {
        Ok(self.get(name)?.as_ref().and_then(UserObject::from_element))
    }

    /// Attribute `name` as a list.
    pub fn get_list(&self, name: &str) -> Result<Option<ListElement>, DomError> {
        Ok(self.get(name)?.and_then(|e| e.as_list().cloned()))
    }

    /// Attribute `name` as a dict.
    pub fn get_dict(&self, name: &str) -> Result<Option<DictElement>, DomError> {
        Ok(self.get(name)?.and_then(|e| e.as_dict().cloned()))
    }

    /// Attribute `name` as plain JSON; `null` when absent.
    pub fn get_plain(&self, name: &str) -> Result<Value, DomError> {
        Ok(self
            .get(name)?
            .map(|e| e.to_plain())
            .unwrap_or(Value::Null))
    }

    /// Store `value` as attribute `name`.
    ///
    /// # Errors
    ///
    /// `KeyError::UnknownAttribute`, or whatever the schema raises.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), DomError> {
        self.object_type.binding(name)?.write(self, value.into())
    }

    /// Remove attribute `name`.
    ///
    /// # Errors
    ///
    /// `KeyError::UnknownAttribute`, or `ValidationError::RequiredKey` for
    /// a required attribute.
    pub fn remove(&self, name: &str) -> Result<Option<Element>, DomError> {
        let binding = self.object_type.binding(name)?;
        self.element.remove(binding.key())
    }

    /// Position in the tree.
    pub fn dom(&self) -> DomInfo {
        self.element.dom()
    }

    /// Root of the containing document.
    pub fn document(&self) -> Option<Element> {
        self.dom().document
    }

    /// The containing element.
    pub fn parent(&self) -> Option<Element> {
        self.dom().parent
    }

    /// Key in the parent.
    pub fn key(&self) -> Option<String> {
        self.dom().key
    }

    /// Plain JSON for the whole object.
    pub fn to_plain(&self) -> Value {
        self.element.to_plain()
    }

    /// Whether both handles refer to the same element.
    pub fn same_instance(&self, other: &UserObject) -> bool {
        self.element.ptr_eq(&other.element)
    }
}

impl PartialEq for UserObject {
    fn eq(&self, other: &Self) -> bool {
        self.object_type == other.object_type && self.to_plain() == other.to_plain()
    }
}

impl fmt::Debug for UserObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserObject")
            .field("type", &self.object_type.name())
            .field("value", &self.to_plain())
            .finish()
    }
}

impl From<UserObject> for Element {
    fn from(object: UserObject) -> Self {
        Element::Object(object.element)
    }
}

impl From<&UserObject> for Value {
    fn from(object: &UserObject) -> Self {
        object.to_plain()
    }
}

impl From<UserObject> for Value {
    fn from(object: UserObject) -> Self {
        object.to_plain()
    }
}

impl From<UserObject> for ObjectElement {
    fn from(object: UserObject) -> Self {
        object.element
    }
}

/// Position of `object` in its tree.
pub fn dom(object: &UserObject) -> DomInfo {
    object.dom()
}

/// Effective attribute bindings of `object`'s type, keyed by storage key.
pub fn properties(object: &UserObject) -> IndexMap<String, AttributeBinding> {
    object.object_type().properties()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyBuilder;
    use sdom_schema::{ObjectSchema, SchemaNode};
    use serde_json::json;

    fn badge() -> ObjectType {
        ObjectType::builder("user_object_tests.Badge")
            .property(PropertyBuilder::new("label", "str").stored_as("badgeLabel"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_from_element_needs_declared_type() {
        let untagged: SchemaNode =
            ObjectSchema::new([("label".to_string(), SchemaNode::string())]).into();
        let element = untagged.accept_root(json!({"label": "x"})).unwrap();
        assert!(UserObject::from_element(&element).is_none());
        assert!(UserObject::from_element(&Element::Leaf(json!(1))).is_none());

        let badge = badge();
        let instance = badge.new_object(json!({"badgeLabel": "gold"})).unwrap();
        let recovered = UserObject::from_element(&instance.as_element()).unwrap();
        assert!(recovered.same_instance(&instance));
        assert!(recovered.object_type().ptr_eq(&badge));
    }

    #[test]
    fn test_attributes_use_storage_keys() {
        let badge = badge().new_object(json!({"badgeLabel": "gold"})).unwrap();
        assert_eq!(badge.get_plain("label").unwrap(), json!("gold"));
        badge.set("label", "silver").unwrap();
        assert_eq!(badge.to_plain(), json!({"badgeLabel": "silver"}));
        assert!(badge.get("badgeLabel").unwrap_err().is_key());
        assert!(properties(&badge).contains_key("badgeLabel"));
    }
}
