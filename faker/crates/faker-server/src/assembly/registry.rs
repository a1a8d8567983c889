//! The merged type system of the prelude, the remote SDL and the user SDL.
//!
//! Merging records every definition together with the document it came from.
//! That origin later decides whether a field is proxied upstream or faked.

use async_graphql::{Name, Value as ConstValue};
use async_graphql_parser::{types as ast, Pos, Positioned};
use indexmap::{map::Entry, IndexMap};

use super::validation::Diagnostics;

pub(crate) const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// The document a definition was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Prelude,
    Remote,
    User,
}

#[derive(Debug, Clone)]
pub(crate) struct Located<T> {
    pub node: T,
    pub origin: Origin,
    pub pos: Pos,
}

impl<T> Located<T> {
    fn new(positioned: &Positioned<T>, origin: Origin) -> Self
    where
        T: Clone,
    {
        Self {
            node: positioned.node.clone(),
            origin,
            pos: positioned.pos,
        }
    }
}

pub(crate) type Directives = Vec<Located<ast::ConstDirective>>;

#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub types: IndexMap<String, TypeDef>,
    pub directives: IndexMap<String, DirectiveDef>,
    pub schema: Option<Located<RootTypes>>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct RootTypes {
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
}

#[derive(Debug)]
pub(crate) struct TypeDef {
    pub name: String,
    pub description: Option<String>,
    pub origin: Origin,
    pub pos: Pos,
    pub directives: Directives,
    pub kind: TypeDefKind,
}

#[derive(Debug)]
pub(crate) enum TypeDefKind {
    Scalar,
    Object(Composite),
    Interface(Composite),
    Union(Vec<Located<String>>),
    Enum(IndexMap<String, EnumValueDef>),
    InputObject(IndexMap<String, InputValueDef>),
}

#[derive(Debug, Default)]
pub(crate) struct Composite {
    pub implements: Vec<Located<String>>,
    pub fields: IndexMap<String, FieldDef>,
}

#[derive(Debug)]
pub(crate) struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: Located<ast::Type>,
    pub arguments: IndexMap<String, InputValueDef>,
    pub directives: Directives,
    pub origin: Origin,
    pub pos: Pos,
}

#[derive(Debug)]
pub(crate) struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: Located<ast::Type>,
    pub default_value: Option<ConstValue>,
    pub directives: Directives,
    pub origin: Origin,
    pub pos: Pos,
}

#[derive(Debug)]
pub(crate) struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub directives: Directives,
    pub origin: Origin,
    pub pos: Pos,
}

#[derive(Debug)]
pub(crate) struct DirectiveDef {
    pub name: String,
    pub arguments: IndexMap<String, InputValueDef>,
    pub locations: Vec<ast::DirectiveLocation>,
    pub origin: Origin,
    pub pos: Pos,
}

impl TypeDefKind {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            TypeDefKind::Scalar => "scalar",
            TypeDefKind::Object(_) => "object",
            TypeDefKind::Interface(_) => "interface",
            TypeDefKind::Union(_) => "union",
            TypeDefKind::Enum(_) => "enum",
            TypeDefKind::InputObject(_) => "input object",
        }
    }

    fn same_kind(&self, other: &ast::TypeKind) -> bool {
        matches!(
            (self, other),
            (TypeDefKind::Scalar, ast::TypeKind::Scalar)
                | (TypeDefKind::Object(_), ast::TypeKind::Object(_))
                | (TypeDefKind::Interface(_), ast::TypeKind::Interface(_))
                | (TypeDefKind::Union(_), ast::TypeKind::Union(_))
                | (TypeDefKind::Enum(_), ast::TypeKind::Enum(_))
                | (TypeDefKind::InputObject(_), ast::TypeKind::InputObject(_))
        )
    }

    pub(crate) fn is_input(&self) -> bool {
        matches!(
            self,
            TypeDefKind::Scalar | TypeDefKind::Enum(_) | TypeDefKind::InputObject(_)
        )
    }

    pub(crate) fn is_output(&self) -> bool {
        !matches!(self, TypeDefKind::InputObject(_))
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, TypeDefKind::Scalar | TypeDefKind::Enum(_))
    }

    pub(crate) fn is_abstract(&self) -> bool {
        matches!(self, TypeDefKind::Interface(_) | TypeDefKind::Union(_))
    }
}

impl TypeDef {
    pub(crate) fn fields(&self) -> Option<&IndexMap<String, FieldDef>> {
        match &self.kind {
            TypeDefKind::Object(composite) | TypeDefKind::Interface(composite) => Some(&composite.fields),
            _ => None,
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields().and_then(|fields| fields.get(name))
    }
}

impl Registry {
    fn with_builtin_scalars() -> Self {
        let mut registry = Registry::default();

        for name in BUILTIN_SCALARS {
            registry.types.insert(
                name.to_owned(),
                TypeDef {
                    name: name.to_owned(),
                    description: None,
                    origin: Origin::Prelude,
                    pos: Pos { line: 0, column: 0 },
                    directives: Vec::new(),
                    kind: TypeDefKind::Scalar,
                },
            );
        }

        registry
    }

    pub(crate) fn query_type(&self) -> &str {
        match self.schema.as_ref() {
            Some(schema) => schema.node.query.as_deref().unwrap_or("Query"),
            None => "Query",
        }
    }

    /// The mutation root, if there is one.
    pub(crate) fn mutation_type(&self) -> Option<&str> {
        match self.schema.as_ref() {
            Some(schema) => schema.node.mutation.as_deref(),
            None => self.types.get("Mutation").map(|ty| ty.name.as_str()),
        }
    }

    /// The object types that can stand in for an abstract type, in declaration order.
    pub(crate) fn possible_types(&self, abstract_type: &str) -> Vec<&str> {
        let Some(ty) = self.types.get(abstract_type) else {
            return Vec::new();
        };

        match &ty.kind {
            TypeDefKind::Union(members) => members.iter().map(|member| member.node.as_str()).collect(),
            TypeDefKind::Interface(_) => self
                .types
                .values()
                .filter(|candidate| match &candidate.kind {
                    TypeDefKind::Object(composite) => composite
                        .implements
                        .iter()
                        .any(|interface| interface.node == abstract_type),
                    _ => false,
                })
                .map(|candidate| candidate.name.as_str())
                .collect(),
            TypeDefKind::Object(_) => vec![ty.name.as_str()],
            _ => Vec::new(),
        }
    }
}

/// Merges the parsed documents into one registry. Definitions are read in
/// document order, then all type extensions are applied.
pub(crate) fn merge(documents: &[(Origin, &ast::ServiceDocument)], diagnostics: &mut Diagnostics<'_>) -> Registry {
    let mut registry = Registry::with_builtin_scalars();
    let mut extensions = Vec::new();

    for (origin, document) in documents {
        for definition in &document.definitions {
            match definition {
                ast::TypeSystemDefinition::Schema(schema) => {
                    merge_schema_definition(&mut registry, schema, *origin, diagnostics);
                }
                ast::TypeSystemDefinition::Directive(directive) => {
                    merge_directive_definition(&mut registry, directive, *origin, diagnostics);
                }
                ast::TypeSystemDefinition::Type(ty) if ty.node.extend => extensions.push((*origin, ty)),
                ast::TypeSystemDefinition::Type(ty) => {
                    merge_type_definition(&mut registry, ty, *origin, diagnostics);
                }
            }
        }
    }

    for (origin, extension) in extensions {
        apply_extension(&mut registry, extension, origin, diagnostics);
    }

    registry
}

fn merge_schema_definition(
    registry: &mut Registry,
    definition: &Positioned<ast::SchemaDefinition>,
    origin: Origin,
    diagnostics: &mut Diagnostics<'_>,
) {
    let node = &definition.node;
    let name = |name: &Option<Positioned<Name>>| name.as_ref().map(|name| name.node.to_string());

    match registry.schema.as_mut() {
        Some(_) if !node.extend => {
            diagnostics.push("Must provide only one schema definition.", origin, definition.pos);
        }
        Some(existing) => {
            let roots = [
                (&mut existing.node.query, &node.query, "query"),
                (&mut existing.node.mutation, &node.mutation, "mutation"),
                (&mut existing.node.subscription, &node.subscription, "subscription"),
            ];

            for (current, extension, operation) in roots {
                match (current.is_some(), extension) {
                    (true, Some(extension)) => diagnostics.push(
                        format!("Type for {operation} already defined in the schema. It cannot be redefined."),
                        origin,
                        extension.pos,
                    ),
                    (false, Some(extension)) => *current = Some(extension.node.to_string()),
                    _ => (),
                }
            }
        }
        None => {
            registry.schema = Some(Located {
                node: RootTypes {
                    query: name(&node.query),
                    mutation: name(&node.mutation),
                    subscription: name(&node.subscription),
                },
                origin,
                pos: definition.pos,
            });
        }
    }
}

fn merge_directive_definition(
    registry: &mut Registry,
    definition: &Positioned<ast::DirectiveDefinition>,
    origin: Origin,
    diagnostics: &mut Diagnostics<'_>,
) {
    let name = definition.node.name.node.to_string();

    if let Some(existing) = registry.directives.get(&name) {
        // Introspected schemas may carry the built-in or fake directives the prelude already declares.
        if !(existing.origin == Origin::Prelude && origin == Origin::Remote) {
            diagnostics.push(
                format!("Directive \"@{name}\" already exists in the schema. It cannot be redefined."),
                origin,
                definition.node.name.pos,
            );
        }

        return;
    }

    let arguments = input_values(&name, &definition.node.arguments, origin, "Argument", diagnostics);
    let locations = definition
        .node
        .locations
        .iter()
        .map(|location| location.node)
        .collect();

    registry.directives.insert(
        name.clone(),
        DirectiveDef {
            name,
            arguments,
            locations,
            origin,
            pos: definition.node.name.pos,
        },
    );
}

fn merge_type_definition(
    registry: &mut Registry,
    definition: &Positioned<ast::TypeDefinition>,
    origin: Origin,
    diagnostics: &mut Diagnostics<'_>,
) {
    let node = &definition.node;
    let name = node.name.node.to_string();

    if let Some(existing) = registry.types.get(&name) {
        // Introspection also returns the built-in scalars, and the fake definitions of a faked upstream.
        if !(existing.origin == Origin::Prelude && origin == Origin::Remote) {
            diagnostics.push(
                format!("Type \"{name}\" already exists in the schema. It cannot also be defined in this type definition."),
                origin,
                node.name.pos,
            );
        }

        return;
    }

    let kind = match &node.kind {
        ast::TypeKind::Scalar => TypeDefKind::Scalar,
        ast::TypeKind::Object(object) => TypeDefKind::Object(composite(
            &name,
            &object.implements,
            &object.fields,
            origin,
            diagnostics,
        )),
        ast::TypeKind::Interface(interface) => TypeDefKind::Interface(composite(
            &name,
            &interface.implements,
            &interface.fields,
            origin,
            diagnostics,
        )),
        ast::TypeKind::Union(union) => {
            let mut members = Vec::new();
            add_union_members(&name, &mut members, &union.members, origin, diagnostics);
            TypeDefKind::Union(members)
        }
        ast::TypeKind::Enum(enum_type) => {
            let mut values = IndexMap::new();
            add_enum_values(&name, &mut values, &enum_type.values, origin, "can only be defined once.", diagnostics);
            TypeDefKind::Enum(values)
        }
        ast::TypeKind::InputObject(input) => {
            TypeDefKind::InputObject(input_values(&name, &input.fields, origin, "Field", diagnostics))
        }
    };

    registry.types.insert(
        name.clone(),
        TypeDef {
            name,
            description: node.description.as_ref().map(|description| description.node.clone()),
            origin,
            pos: node.name.pos,
            directives: directives(&node.directives, origin),
            kind,
        },
    );
}

fn apply_extension(
    registry: &mut Registry,
    extension: &Positioned<ast::TypeDefinition>,
    origin: Origin,
    diagnostics: &mut Diagnostics<'_>,
) {
    let node = &extension.node;
    let name = node.name.node.to_string();

    let Some(existing) = registry.types.get_mut(&name) else {
        diagnostics.push(
            format!("Cannot extend type \"{name}\" because it is not defined."),
            origin,
            node.name.pos,
        );
        return;
    };

    if !existing.kind.same_kind(&node.kind) {
        diagnostics.push(
            format!("Cannot extend non-{} type \"{name}\".", extension_kind(&node.kind)),
            origin,
            node.name.pos,
        );
        return;
    }

    existing.directives.extend(directives(&node.directives, origin));

    const EXTENSION_CONFLICT: &str = "already exists in the schema. It cannot also be defined in this type extension.";

    match (&mut existing.kind, &node.kind) {
        (TypeDefKind::Object(composite), ast::TypeKind::Object(object)) => {
            extend_composite(&name, composite, &object.implements, &object.fields, origin, diagnostics);
        }
        (TypeDefKind::Interface(composite), ast::TypeKind::Interface(interface)) => {
            extend_composite(&name, composite, &interface.implements, &interface.fields, origin, diagnostics);
        }
        (TypeDefKind::Union(members), ast::TypeKind::Union(union)) => {
            add_union_members(&name, members, &union.members, origin, diagnostics);
        }
        (TypeDefKind::Enum(values), ast::TypeKind::Enum(enum_type)) => {
            add_enum_values(&name, values, &enum_type.values, origin, EXTENSION_CONFLICT, diagnostics);
        }
        (TypeDefKind::InputObject(fields), ast::TypeKind::InputObject(input)) => {
            for field in &input.fields {
                let field_name = field.node.name.node.to_string();

                if fields.contains_key(&field_name) {
                    diagnostics.push(
                        format!("Field \"{name}.{field_name}\" {EXTENSION_CONFLICT}"),
                        origin,
                        field.node.name.pos,
                    );
                } else {
                    fields.insert(field_name, input_value(field, origin));
                }
            }
        }
        _ => (),
    }
}

fn extension_kind(kind: &ast::TypeKind) -> &'static str {
    match kind {
        ast::TypeKind::Scalar => "scalar",
        ast::TypeKind::Object(_) => "object",
        ast::TypeKind::Interface(_) => "interface",
        ast::TypeKind::Union(_) => "union",
        ast::TypeKind::Enum(_) => "enum",
        ast::TypeKind::InputObject(_) => "input object",
    }
}

fn composite(
    type_name: &str,
    implements: &[Positioned<Name>],
    fields: &[Positioned<ast::FieldDefinition>],
    origin: Origin,
    diagnostics: &mut Diagnostics<'_>,
) -> Composite {
    let mut composite = Composite::default();

    for field in fields {
        let field_name = field.node.name.node.to_string();

        match composite.fields.entry(field_name) {
            Entry::Occupied(entry) => diagnostics.push(
                format!("Field \"{type_name}.{}\" can only be defined once.", entry.key()),
                origin,
                field.node.name.pos,
            ),
            Entry::Vacant(entry) => {
                entry.insert(field_definition(type_name, field, origin, diagnostics));
            }
        }
    }

    add_implements(type_name, &mut composite.implements, implements, origin, diagnostics);

    composite
}

fn extend_composite(
    type_name: &str,
    composite: &mut Composite,
    implements: &[Positioned<Name>],
    fields: &[Positioned<ast::FieldDefinition>],
    origin: Origin,
    diagnostics: &mut Diagnostics<'_>,
) {
    for field in fields {
        let field_name = field.node.name.node.to_string();

        if composite.fields.contains_key(&field_name) {
            diagnostics.push(
                format!(
                    "Field \"{type_name}.{field_name}\" already exists in the schema. It cannot also be defined in this type extension."
                ),
                origin,
                field.node.name.pos,
            );
            continue;
        }

        let definition = field_definition(type_name, field, origin, diagnostics);
        composite.fields.insert(field_name, definition);
    }

    add_implements(type_name, &mut composite.implements, implements, origin, diagnostics);
}

fn add_implements(
    type_name: &str,
    current: &mut Vec<Located<String>>,
    implements: &[Positioned<Name>],
    origin: Origin,
    diagnostics: &mut Diagnostics<'_>,
) {
    for interface in implements {
        if current.iter().any(|existing| existing.node == interface.node.as_str()) {
            diagnostics.push(
                format!("Type {type_name} can only implement {} once.", interface.node),
                origin,
                interface.pos,
            );
            continue;
        }

        current.push(Located {
            node: interface.node.to_string(),
            origin,
            pos: interface.pos,
        });
    }
}

fn add_union_members(
    type_name: &str,
    current: &mut Vec<Located<String>>,
    members: &[Positioned<Name>],
    origin: Origin,
    diagnostics: &mut Diagnostics<'_>,
) {
    for member in members {
        if current.iter().any(|existing| existing.node == member.node.as_str()) {
            diagnostics.push(
                format!("Union type {type_name} can only include type {} once.", member.node),
                origin,
                member.pos,
            );
            continue;
        }

        current.push(Located {
            node: member.node.to_string(),
            origin,
            pos: member.pos,
        });
    }
}

fn add_enum_values(
    type_name: &str,
    current: &mut IndexMap<String, EnumValueDef>,
    values: &[Positioned<ast::EnumValueDefinition>],
    origin: Origin,
    conflict: &str,
    diagnostics: &mut Diagnostics<'_>,
) {
    for value in values {
        let name = value.node.value.node.to_string();

        if current.contains_key(&name) {
            diagnostics.push(
                format!("Enum value \"{type_name}.{name}\" {conflict}"),
                origin,
                value.node.value.pos,
            );
            continue;
        }

        current.insert(
            name.clone(),
            EnumValueDef {
                name,
                description: value.node.description.as_ref().map(|d| d.node.clone()),
                directives: directives(&value.node.directives, origin),
                origin,
                pos: value.node.value.pos,
            },
        );
    }
}

fn field_definition(
    type_name: &str,
    field: &Positioned<ast::FieldDefinition>,
    origin: Origin,
    diagnostics: &mut Diagnostics<'_>,
) -> FieldDef {
    let node = &field.node;
    let name = node.name.node.to_string();
    let owner = format!("{type_name}.{name}");

    FieldDef {
        arguments: input_values(&owner, &node.arguments, origin, "Argument", diagnostics),
        description: node.description.as_ref().map(|description| description.node.clone()),
        ty: Located::new(&node.ty, origin),
        directives: directives(&node.directives, origin),
        origin,
        pos: node.name.pos,
        name,
    }
}

fn input_values(
    owner: &str,
    values: &[Positioned<ast::InputValueDefinition>],
    origin: Origin,
    label: &str,
    diagnostics: &mut Diagnostics<'_>,
) -> IndexMap<String, InputValueDef> {
    let mut result = IndexMap::with_capacity(values.len());

    for value in values {
        let name = value.node.name.node.to_string();

        if result.contains_key(&name) {
            let description = match label {
                "Argument" => format!("Argument \"{owner}({name}:)\""),
                _ => format!("{label} \"{owner}.{name}\""),
            };

            diagnostics.push(
                format!("{description} can only be defined once."),
                origin,
                value.node.name.pos,
            );
            continue;
        }

        result.insert(name, input_value(value, origin));
    }

    result
}

fn input_value(value: &Positioned<ast::InputValueDefinition>, origin: Origin) -> InputValueDef {
    let node = &value.node;

    InputValueDef {
        name: node.name.node.to_string(),
        description: node.description.as_ref().map(|description| description.node.clone()),
        ty: Located::new(&node.ty, origin),
        default_value: node.default_value.as_ref().map(|value| value.node.clone()),
        directives: directives(&node.directives, origin),
        origin,
        pos: node.name.pos,
    }
}

fn directives(directives: &[Positioned<ast::ConstDirective>], origin: Origin) -> Directives {
    directives
        .iter()
        .map(|directive| Located::new(directive, origin))
        .collect()
}

/// The innermost named type of a possibly wrapped type.
pub(crate) fn named_type(ty: &ast::Type) -> &str {
    match &ty.base {
        ast::BaseType::Named(name) => name.as_str(),
        ast::BaseType::List(inner) => named_type(inner),
    }
}

/// Looks up a constant argument of the first directive called `name`.
pub(crate) fn directive_argument<'a>(directives: &'a Directives, name: &str, argument: &str) -> Option<&'a ConstValue> {
    directives
        .iter()
        .find(|directive| directive.node.name.node.as_str() == name)
        .and_then(|directive| directive.node.get_argument(argument))
        .map(|value| &value.node)
}

pub(crate) fn has_directive(directives: &Directives, name: &str) -> bool {
    directives.iter().any(|directive| directive.node.name.node.as_str() == name)
}
