//! # Declared Object Types
//!
//! An [`ObjectType`] is a runtime declaration of a record type: a qualified
//! name, an optional parent, an ordered list of attribute bindings and an
//! additional-properties policy. Types are declared once with
//! [`ObjectType::builder`] and shared by cheap handle.
//!
//! ## Inheritance
//!
//! Effective bindings are collected from the most basic ancestor to the type
//! itself; a derived binding for the same storage key replaces the base one
//! in place. The required set is every non-optional key of the effective
//! bindings.
//!
//! ## Registration
//!
//! The first type in a line of descent declared with
//! [`TypeBuilder::registers_subclasses`] is a family root: it opens a
//! registry namespace named after itself. Every descendant
//! registers into that namespace, under [`TypeBuilder::register_as`] or by
//! default under its qualified name. [`TypeBuilder::inherit_registered_name`]
//! shares the parent's registered name instead, which makes that name
//! resolve through common-ancestor lookup.
//!
//! ## Polymorphism
//!
//! [`ObjectType::schema`] is a provided node: every use asks the registry
//! which subtypes exist *now*. A type with registered subtypes validates as
//! a union of its current leaf subtypes; otherwise it validates as a plain
//! object schema built from its bindings.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use sdom_core::{describe, ConstructionError, DomError, KeyError, ValidationError};
use sdom_registry::{NamespaceKey, RegisteredType};
use sdom_schema::{
    Additional, AnyOfSchema, DeclaredType, ObjectSchema, Position, SchemaNode, SchemaProvider,
};

use crate::property::{AttributeBinding, PropertyBuilder};
use crate::registry::registry;
use crate::user_object::UserObject;

pub(crate) struct TypeDecl {
    name: String,
    parent: Option<ObjectType>,
    bindings: Vec<AttributeBinding>,
    additional: Additional,
    namespace: Option<NamespaceKey>,
    registered_name: Option<String>,
}

impl RegisteredType for TypeDecl {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn is_subtype_of(&self, other: &Self) -> bool {
        let mut current: Option<&TypeDecl> = Some(self);
        while let Some(decl) = current {
            if std::ptr::eq(decl, other) {
                return true;
            }
            current = decl.parent.as_ref().map(|p| p.0.as_ref());
        }
        false
    }
}

impl DeclaredType for TypeDecl {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl fmt::Debug for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(ObjectType::name))
            .field("registered_name", &self.registered_name)
            .finish_non_exhaustive()
    }
}

/// Handle to a declared object type. Clones share the declaration;
/// equality is identity.
#[derive(Clone)]
pub struct ObjectType(pub(crate) Arc<TypeDecl>);

impl ObjectType {
    /// Start declaring a type called `name` (fully qualified, e.g.
    /// `"pets.Dog"`).
    pub fn builder(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
            additional: None,
            registers_subclasses: false,
            register_as: None,
            inherit_registered_name: false,
        }
    }

    /// Fully-qualified name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Direct parent type.
    pub fn parent(&self) -> Option<&ObjectType> {
        self.0.parent.as_ref()
    }

    /// Name under which the type is registered, if any.
    pub fn registered_name(&self) -> Option<&str> {
        self.0.registered_name.as_deref()
    }

    /// Registry namespace of the type's family, if any.
    pub fn namespace(&self) -> Option<&NamespaceKey> {
        self.0.namespace.as_ref()
    }

    /// Policy for keys that are not declared attributes.
    pub fn additional(&self) -> &Additional {
        &self.0.additional
    }

    /// Whether `self` is `other` or descends from it.
    pub fn is_subtype_of(&self, other: &ObjectType) -> bool {
        self.0.is_subtype_of(&other.0)
    }

    /// Whether both handles refer to the same declaration.
    pub fn ptr_eq(&self, other: &ObjectType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Effective bindings keyed by storage key: ancestors first, derived
    /// bindings replacing base ones in place.
    pub fn properties(&self) -> IndexMap<String, AttributeBinding> {
        let mut lineage: Vec<&TypeDecl> = Vec::new();
        let mut current: Option<&TypeDecl> = Some(&self.0);
        while let Some(decl) = current {
            lineage.push(decl);
            current = decl.parent.as_ref().map(|p| p.0.as_ref());
        }
        let mut properties = IndexMap::new();
        for decl in lineage.into_iter().rev() {
            for binding in &decl.bindings {
                properties.insert(binding.key().to_string(), binding.clone());
            }
        }
        properties
    }

    /// The binding for attribute `name`.
    ///
    /// # Errors
    ///
    /// `KeyError::UnknownAttribute` if no effective binding has that name.
    pub fn binding(&self, name: &str) -> Result<AttributeBinding, KeyError> {
        self.properties()
            .into_values()
            .filter(|b| b.name() == name)
            .last()
            .ok_or_else(|| KeyError::UnknownAttribute {
                type_name: self.name().to_string(),
                attribute: name.to_string(),
            })
    }

    /// The plain object schema of exactly this type, ignoring subtypes.
    pub fn object_schema(&self) -> ObjectSchema {
        let properties = self.properties();
        let required: Vec<String> = properties
            .values()
            .filter(|b| b.is_required())
            .map(|b| b.key().to_string())
            .collect();
        ObjectSchema::new(
            properties
                .iter()
                .map(|(key, binding)| (key.clone(), binding.schema().clone())),
        )
        .with_required(required)
        .with_additional(self.0.additional.clone())
        .named(self.name())
        .for_type(Arc::clone(&self.0) as Arc<dyn DeclaredType>)
    }

    /// Live schema node: resolves through the registry on every use.
    pub fn schema(&self) -> SchemaNode {
        SchemaNode::provided(ObjectTypeSchema(self.clone()))
    }

    /// The schema in effect right now: a union over the current leaf
    /// subtypes if any are registered, else the plain object schema.
    pub fn resolved_schema(&self) -> SchemaNode {
        let leaves = self.leaf_subclasses();
        if leaves.is_empty() {
            return self.object_schema().into();
        }
        tracing::trace!(
            type_name = self.name(),
            leaves = leaves.len(),
            "resolved polymorphic schema"
        );
        AnyOfSchema::new(leaves.iter().map(|leaf| leaf.schema()))
            .named(self.name())
            .into()
    }

    /// Standalone Draft-07 document for the live schema.
    pub fn full_schema(&self) -> Value {
        self.schema().full_schema()
    }

    /// Build an instance from `value`, dispatching to whichever registered
    /// subtype alone accepts it.
    ///
    /// # Errors
    ///
    /// Any `DomError` raised while accepting the value.
    pub fn accept(&self, value: Value) -> Result<UserObject, DomError> {
        let element = self.schema().accept_root(value.clone())?;
        UserObject::from_element(&element).ok_or_else(|| {
            ValidationError::WrongType {
                expected: self.name().to_string(),
                value: describe(&value),
            }
            .into()
        })
    }

    /// Build an instance of exactly this type from `value`.
    ///
    /// # Errors
    ///
    /// Any `DomError` raised while accepting the value.
    pub fn new_object(&self, value: Value) -> Result<UserObject, DomError> {
        self.new_object_at(value, Position::root())
    }

    /// Build an instance of exactly this type at `position`.
    pub fn new_object_at(&self, value: Value, position: Position) -> Result<UserObject, DomError> {
        let schema = Arc::new(self.object_schema());
        let element = sdom_schema::ObjectElement::build(schema, value, position)?;
        Ok(UserObject::new(self.clone(), element))
    }

    /// Registered proper subtypes per registered name.
    pub fn registered_subclasses(&self) -> IndexMap<String, Vec<ObjectType>> {
        let Some(namespace) = self.namespace() else {
            return IndexMap::new();
        };
        registry()
            .read()
            .subclasses_of(namespace, &self.0)
            .into_iter()
            .map(|(name, decls)| (name, decls.into_iter().map(ObjectType).collect()))
            .collect()
    }

    /// The registered proper subtype called `name`.
    ///
    /// # Errors
    ///
    /// `KeyError::Unknown` or `KeyError::Ambiguous`.
    pub fn registered_subclass(&self, name: &str) -> Result<ObjectType, KeyError> {
        let Some(namespace) = self.namespace() else {
            return Err(KeyError::Unknown {
                name: name.to_string(),
            });
        };
        registry()
            .read()
            .lookup(namespace, name, &self.0)
            .map(ObjectType)
    }

    /// Build an instance of the registered subtype called `name`.
    ///
    /// # Errors
    ///
    /// `KeyError` if the name does not resolve, or any error raised while
    /// accepting the value.
    pub fn registered_subclass_instance(
        &self,
        name: &str,
        value: Value,
    ) -> Result<UserObject, DomError> {
        self.registered_subclass(name)?.new_object(value)
    }

    /// Registered proper subtypes with no registered subtypes of their own,
    /// each listed once.
    fn leaf_subclasses(&self) -> Vec<ObjectType> {
        let Some(namespace) = self.namespace() else {
            return Vec::new();
        };
        let guard = registry().read();
        let mut leaves: Vec<ObjectType> = Vec::new();
        for decl in guard.subclasses_of(namespace, &self.0).into_values().flatten() {
            let is_leaf = !guard.has_subclasses(namespace, &decl);
            if is_leaf && !leaves.iter().any(|l| Arc::ptr_eq(&l.0, &decl)) {
                leaves.push(ObjectType(decl));
            }
        }
        leaves
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectType {}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves a declared type's schema against the registry on every call.
#[derive(Debug)]
pub struct ObjectTypeSchema(ObjectType);

impl SchemaProvider for ObjectTypeSchema {
    fn resolve(&self) -> SchemaNode {
        self.0.resolved_schema()
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Declares an [`ObjectType`].
pub struct TypeBuilder {
    name: String,
    parent: Option<ObjectType>,
    properties: Vec<PropertyBuilder>,
    additional: Option<Additional>,
    registers_subclasses: bool,
    register_as: Option<String>,
    inherit_registered_name: bool,
}

impl TypeBuilder {
    /// Derive from `parent`.
    pub fn extends(mut self, parent: &ObjectType) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declare a property. Declaration order is kept.
    pub fn property(mut self, property: PropertyBuilder) -> Self {
        self.properties.push(property);
        self
    }

    /// Policy for undeclared keys. Inherited from the parent when unset;
    /// forbidden for root types.
    pub fn additional_properties(mut self, additional: Additional) -> Self {
        self.additional = Some(additional);
        self
    }

    /// Make this type a family root that registers its subtypes. A type
    /// already inside a family stays in that family.
    pub fn registers_subclasses(mut self) -> Self {
        self.registers_subclasses = true;
        self
    }

    /// Register under `name` instead of the qualified name.
    pub fn register_as(mut self, name: impl Into<String>) -> Self {
        self.register_as = Some(name.into());
        self
    }

    /// Share the parent's registered name.
    pub fn inherit_registered_name(mut self) -> Self {
        self.inherit_registered_name = true;
        self
    }

    /// Validate the declaration and register the type.
    ///
    /// # Errors
    ///
    /// `ConstructionError` for a malformed property, a duplicated storage
    /// key, or a registered name without a family root; `KeyError` for a
    /// naming conflict in the registry.
    pub fn build(self) -> Result<ObjectType, DomError> {
        let mut bindings: Vec<AttributeBinding> = Vec::with_capacity(self.properties.len());
        for property in self.properties {
            let binding = property.build()?.owned_by(&self.name);
            if bindings.iter().any(|b| b.key() == binding.key()) {
                return Err(ConstructionError::DuplicateKey {
                    type_name: self.name,
                    key: binding.key().to_string(),
                }
                .into());
            }
            bindings.push(binding);
        }

        // A family is fixed by the first ancestor that registers subtypes.
        let namespace = self
            .parent
            .as_ref()
            .and_then(|p| p.namespace().cloned())
            .or_else(|| {
                self.registers_subclasses
                    .then(|| NamespaceKey::new(self.name.clone()))
            });
        let inherited_name = if self.inherit_registered_name {
            self.parent
                .as_ref()
                .and_then(|p| p.registered_name().map(str::to_string))
        } else {
            None
        };
        let registered_name = match &namespace {
            Some(_) => Some(
                inherited_name
                    .clone()
                    .or_else(|| self.register_as.clone())
                    .unwrap_or_else(|| self.name.clone()),
            ),
            None if self.register_as.is_some() || self.inherit_registered_name => {
                return Err(ConstructionError::NotRegistrable {
                    type_name: self.name,
                }
                .into());
            }
            None => None,
        };
        let additional = self
            .additional
            .or_else(|| self.parent.as_ref().map(|p| p.additional().clone()))
            .unwrap_or_default();

        let object_type = ObjectType(Arc::new(TypeDecl {
            name: self.name,
            parent: self.parent,
            bindings,
            additional,
            namespace,
            registered_name,
        }));

        if let (Some(namespace), Some(name)) =
            (object_type.namespace(), object_type.registered_name())
        {
            let decl = Arc::clone(&object_type.0);
            let mut guard = registry().write();
            if inherited_name.is_some() {
                guard.register_alias(namespace, name, decl)?;
            } else {
                guard.register(namespace, name, decl)?;
            }
        }
        tracing::debug!(
            type_name = object_type.name(),
            registered_name = object_type.registered_name(),
            "declared object type"
        );
        Ok(object_type)
    }
}
