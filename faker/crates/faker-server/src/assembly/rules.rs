//! Structural checks over the merged registry. Every rule reports into the
//! shared diagnostics and keeps going, so one pass finds every problem.

use async_graphql::Value as ConstValue;
use async_graphql_parser::{
    types::{self as ast, DirectiveLocation},
    Pos,
};
use indexmap::IndexMap;

use super::{
    registry::{named_type, Composite, Directives, FieldDef, InputValueDef, Located, Origin, Registry, TypeDefKind},
    validation::Diagnostics,
};
use crate::fake::FAKE_TYPES;

pub(crate) fn validate(registry: &Registry, diagnostics: &mut Diagnostics<'_>) {
    validate_roots(registry, diagnostics);

    for directive in registry.directives.values() {
        reserved_name(&directive.name, directive.origin, directive.pos, diagnostics);
    }

    for ty in registry.types.values() {
        if ty.origin == Origin::Prelude {
            continue;
        }

        reserved_name(&ty.name, ty.origin, ty.pos, diagnostics);

        let location = match &ty.kind {
            TypeDefKind::Scalar => DirectiveLocation::Scalar,
            TypeDefKind::Object(_) => DirectiveLocation::Object,
            TypeDefKind::Interface(_) => DirectiveLocation::Interface,
            TypeDefKind::Union(_) => DirectiveLocation::Union,
            TypeDefKind::Enum(_) => DirectiveLocation::Enum,
            TypeDefKind::InputObject(_) => DirectiveLocation::InputObject,
        };

        validate_directives(registry, &ty.directives, location, &ty.name, diagnostics);

        match &ty.kind {
            TypeDefKind::Scalar => (),
            TypeDefKind::Object(composite) | TypeDefKind::Interface(composite) => {
                validate_composite(registry, &ty.name, &ty.kind, composite, ty.origin, ty.pos, diagnostics);
            }
            TypeDefKind::Union(members) => {
                if members.is_empty() {
                    diagnostics.push(
                        format!("Union type {} must define one or more member types.", ty.name),
                        ty.origin,
                        ty.pos,
                    );
                }

                for member in members {
                    match registry.types.get(&member.node).map(|member| &member.kind) {
                        None => diagnostics.push(format!("Unknown type \"{}\".", member.node), member.origin, member.pos),
                        Some(TypeDefKind::Object(_)) => (),
                        Some(other) => diagnostics.push(
                            format!(
                                "Union type {} can only include Object types, it cannot include {} {}.",
                                ty.name,
                                other.describe(),
                                member.node
                            ),
                            member.origin,
                            member.pos,
                        ),
                    }
                }
            }
            TypeDefKind::Enum(values) => {
                if values.is_empty() {
                    diagnostics.push(
                        format!("Enum type {} must define one or more values.", ty.name),
                        ty.origin,
                        ty.pos,
                    );
                }

                for value in values.values() {
                    reserved_name(&value.name, value.origin, value.pos, diagnostics);

                    let owner = format!("{}.{}", ty.name, value.name);
                    validate_directives(registry, &value.directives, DirectiveLocation::EnumValue, &owner, diagnostics);
                }
            }
            TypeDefKind::InputObject(fields) => {
                if fields.is_empty() {
                    diagnostics.push(
                        format!("Input Object type {} must define one or more fields.", ty.name),
                        ty.origin,
                        ty.pos,
                    );
                }

                for field in fields.values() {
                    let owner = format!("{}.{}", ty.name, field.name);
                    validate_input_value(registry, &owner, field, DirectiveLocation::InputFieldDefinition, diagnostics);
                }
            }
        }
    }
}

/// Names starting with `__` belong to introspection. Only the user SDL is held to it.
fn reserved_name(name: &str, origin: Origin, pos: Pos, diagnostics: &mut Diagnostics<'_>) {
    if origin == Origin::User && name.starts_with("__") {
        diagnostics.push(
            format!("Name \"{name}\" must not begin with \"__\", which is reserved by GraphQL introspection."),
            origin,
            pos,
        );
    }
}

fn validate_roots(registry: &Registry, diagnostics: &mut Diagnostics<'_>) {
    let query = registry.query_type();

    match registry.types.get(query).map(|ty| &ty.kind) {
        Some(TypeDefKind::Object(_)) => (),
        Some(other) => match &registry.schema {
            Some(schema) => diagnostics.push(
                format!(
                    "Query root type must be Object type, it cannot be {} {query}.",
                    other.describe()
                ),
                schema.origin,
                schema.pos,
            ),
            None => diagnostics.push_unlocated(format!(
                "Query root type must be Object type, it cannot be {} {query}.",
                other.describe()
            )),
        },
        None => match &registry.schema {
            Some(schema) => diagnostics.push(
                format!("Query root type {query} is not defined."),
                schema.origin,
                schema.pos,
            ),
            None => diagnostics.push_unlocated("Query root type must be provided."),
        },
    }

    let Some(schema) = &registry.schema else {
        return;
    };

    let roots = [
        ("Mutation", schema.node.mutation.as_deref()),
        ("Subscription", schema.node.subscription.as_deref()),
    ];

    for (operation, name) in roots {
        let Some(name) = name else { continue };

        match registry.types.get(name).map(|ty| &ty.kind) {
            Some(TypeDefKind::Object(_)) => (),
            Some(other) => diagnostics.push(
                format!(
                    "{operation} root type must be Object type if provided, it cannot be {} {name}.",
                    other.describe()
                ),
                schema.origin,
                schema.pos,
            ),
            None => diagnostics.push(
                format!("{operation} root type {name} is not defined."),
                schema.origin,
                schema.pos,
            ),
        }
    }
}

fn validate_composite(
    registry: &Registry,
    type_name: &str,
    kind: &TypeDefKind,
    composite: &Composite,
    origin: Origin,
    pos: Pos,
    diagnostics: &mut Diagnostics<'_>,
) {
    if composite.fields.is_empty() {
        diagnostics.push(format!("Type {type_name} must define one or more fields."), origin, pos);
    }

    for field in composite.fields.values() {
        validate_field(registry, type_name, field, diagnostics);
    }

    for interface in &composite.implements {
        validate_implementation(registry, type_name, kind, &composite.fields, interface, diagnostics);
    }
}

fn validate_field(registry: &Registry, type_name: &str, field: &FieldDef, diagnostics: &mut Diagnostics<'_>) {
    let owner = format!("{type_name}.{}", field.name);

    reserved_name(&field.name, field.origin, field.pos, diagnostics);

    match registry.types.get(named_type(&field.ty.node)) {
        None => unknown_type(&field.ty, diagnostics),
        Some(ty) if !ty.kind.is_output() => diagnostics.push(
            format!("The type of {owner} must be Output Type but got: {}.", field.ty.node),
            field.ty.origin,
            field.ty.pos,
        ),
        Some(_) => (),
    }

    for argument in field.arguments.values() {
        let owner = format!("{owner}({}:)", argument.name);
        validate_input_value(registry, &owner, argument, DirectiveLocation::ArgumentDefinition, diagnostics);
    }

    validate_directives(
        registry,
        &field.directives,
        DirectiveLocation::FieldDefinition,
        &owner,
        diagnostics,
    );
}

fn validate_input_value(
    registry: &Registry,
    owner: &str,
    value: &InputValueDef,
    location: DirectiveLocation,
    diagnostics: &mut Diagnostics<'_>,
) {
    reserved_name(&value.name, value.origin, value.pos, diagnostics);

    match registry.types.get(named_type(&value.ty.node)) {
        None => unknown_type(&value.ty, diagnostics),
        Some(ty) if !ty.kind.is_input() => diagnostics.push(
            format!("The type of {owner} must be Input Type but got: {}.", value.ty.node),
            value.ty.origin,
            value.ty.pos,
        ),
        Some(_) => (),
    }

    validate_directives(registry, &value.directives, location, owner, diagnostics);
}

fn validate_implementation(
    registry: &Registry,
    type_name: &str,
    kind: &TypeDefKind,
    fields: &IndexMap<String, FieldDef>,
    interface: &Located<String>,
    diagnostics: &mut Diagnostics<'_>,
) {
    let interface_name = interface.node.as_str();

    let interface_fields = match registry.types.get(interface_name).map(|ty| &ty.kind) {
        None => {
            diagnostics.push(
                format!("Unknown type \"{interface_name}\"."),
                interface.origin,
                interface.pos,
            );
            return;
        }
        Some(TypeDefKind::Interface(composite)) => &composite.fields,
        Some(other) => {
            diagnostics.push(
                format!(
                    "Type {type_name} must only implement Interface types, it cannot implement {} {interface_name}.",
                    other.describe()
                ),
                interface.origin,
                interface.pos,
            );
            return;
        }
    };

    if interface_name == type_name && matches!(kind, TypeDefKind::Interface(_)) {
        diagnostics.push(
            format!("Type {type_name} cannot implement itself because it would create a circular reference."),
            interface.origin,
            interface.pos,
        );
        return;
    }

    for (field_name, interface_field) in interface_fields {
        let Some(field) = fields.get(field_name) else {
            diagnostics.push(
                format!("Interface field {interface_name}.{field_name} expected but {type_name} does not provide it."),
                interface.origin,
                interface.pos,
            );
            continue;
        };

        if named_type(&field.ty.node) != named_type(&interface_field.ty.node) {
            diagnostics.push(
                format!(
                    "Interface field {interface_name}.{field_name} expects type {} but {type_name}.{field_name} is type {}.",
                    interface_field.ty.node, field.ty.node
                ),
                field.ty.origin,
                field.ty.pos,
            );
        }
    }
}

fn unknown_type(ty: &Located<ast::Type>, diagnostics: &mut Diagnostics<'_>) {
    diagnostics.push(
        format!("Unknown type \"{}\".", named_type(&ty.node)),
        ty.origin,
        ty.pos,
    );
}

fn validate_directives(
    registry: &Registry,
    directives: &Directives,
    location: DirectiveLocation,
    owner: &str,
    diagnostics: &mut Diagnostics<'_>,
) {
    for directive in directives {
        let name = directive.node.name.node.as_str();

        let Some(definition) = registry.directives.get(name) else {
            diagnostics.push(format!("Unknown directive \"@{name}\"."), directive.origin, directive.pos);
            continue;
        };

        if !definition.locations.contains(&location) {
            diagnostics.push(
                format!("Directive \"@{name}\" may not be used on {}.", location_name(location)),
                directive.origin,
                directive.pos,
            );
            continue;
        }

        for (argument, _) in &directive.node.arguments {
            if !definition.arguments.contains_key(argument.node.as_str()) {
                diagnostics.push(
                    format!("Unknown argument \"{}\" on directive \"@{name}\".", argument.node),
                    directive.origin,
                    argument.pos,
                );
            }
        }

        let mut missing_argument = false;

        for argument in definition.arguments.values() {
            let required = !argument.ty.node.nullable && argument.default_value.is_none();

            if required && directive.node.get_argument(&argument.name).is_none() {
                missing_argument = true;
                diagnostics.push(
                    format!(
                        "Directive \"@{name}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                        argument.name, argument.ty.node
                    ),
                    directive.origin,
                    directive.pos,
                );
            }
        }

        if !missing_argument {
            validate_fake_directive(name, directive, owner, diagnostics);
        }
    }
}

/// Argument checks for the fake directives, beyond what their definitions express.
fn validate_fake_directive(
    name: &str,
    directive: &Located<ast::ConstDirective>,
    owner: &str,
    diagnostics: &mut Diagnostics<'_>,
) {
    let argument = |argument: &str| directive.node.get_argument(argument);

    match name {
        "fake" => {
            let Some(value) = argument("type") else { return };

            let valid = match &value.node {
                ConstValue::Enum(fake_type) => FAKE_TYPES.contains(&fake_type.as_str()),
                _ => false,
            };

            if !valid {
                diagnostics.push(
                    format!("Invalid @fake type {} on {owner}, expected one of fake__Types.", value.node),
                    directive.origin,
                    value.pos,
                );
            }
        }
        "listLength" => {
            let (Some(min), Some(max)) = (argument("min"), argument("max")) else {
                return;
            };

            match (as_length(&min.node), as_length(&max.node)) {
                (Some(min), Some(max)) if min <= max => (),
                (Some(_), Some(_)) => diagnostics.push(
                    format!("@listLength on {owner} has a min greater than its max."),
                    directive.origin,
                    directive.pos,
                ),
                _ => diagnostics.push(
                    format!("@listLength on {owner} expects non-negative integers for min and max."),
                    directive.origin,
                    directive.pos,
                ),
            }
        }
        "examples" => {
            let Some(values) = argument("values") else { return };

            if !matches!(values.node, ConstValue::List(_)) {
                diagnostics.push(
                    format!("@examples on {owner} expects a list of values."),
                    directive.origin,
                    values.pos,
                );
            }
        }
        _ => (),
    }
}

pub(crate) fn as_length(value: &ConstValue) -> Option<u64> {
    match value {
        ConstValue::Number(number) => number.as_u64(),
        _ => None,
    }
}

fn location_name(location: DirectiveLocation) -> &'static str {
    match location {
        DirectiveLocation::Scalar => "SCALAR",
        DirectiveLocation::Object => "OBJECT",
        DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
        DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
        DirectiveLocation::Interface => "INTERFACE",
        DirectiveLocation::Union => "UNION",
        DirectiveLocation::Enum => "ENUM",
        DirectiveLocation::EnumValue => "ENUM_VALUE",
        DirectiveLocation::InputObject => "INPUT_OBJECT",
        DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        _ => "this location",
    }
}
