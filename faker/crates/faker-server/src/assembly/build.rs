//! Turns a validated registry into an executable schema.
//!
//! Every field gets the same resolver. It reads the value from its parent when
//! the parent already carries it, proxies remote root fields upstream, and
//! fakes everything else.

use std::sync::Arc;

use async_graphql::{
    dynamic::{
        Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface, InterfaceField, Object,
        ResolverContext, Scalar, Schema, SchemaError, TypeRef, Union,
    },
    Name, Value as ConstValue,
};
use async_graphql_parser::types as ast;
use rand::Rng;
use serde_json::{Map, Value};

use super::{
    registry::{
        directive_argument, has_directive, Directives, FieldDef, InputValueDef, Origin, Registry, TypeDef,
        TypeDefKind, BUILTIN_SCALARS,
    },
    rules::as_length,
};
use crate::{
    fake,
    proxy::{self, Upstream},
};

const DEFAULT_LIST_LENGTH: (u64, u64) = (2, 4);
const DEFAULT_DEPRECATION: &str = "No longer supported";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Fake,
    Remote,
}

/// The parent value handed to the fields of a composite type.
#[derive(Debug)]
struct Node {
    source: Source,
    data: Map<String, Value>,
}

impl Node {
    fn new(source: Source, value: Value) -> Self {
        let data = match value {
            Value::Object(data) => data,
            _ => Map::new(),
        };

        Self { source, data }
    }
}

struct Resolver {
    registry: Registry,
    upstream: Option<Upstream>,
    mutation: Option<String>,
}

pub(super) fn build(registry: Registry, upstream: Option<Upstream>) -> Result<Schema, SchemaError> {
    let query = registry.query_type().to_owned();
    let mutation = registry.mutation_type().map(str::to_owned);

    let resolver = Arc::new(Resolver {
        registry,
        upstream,
        mutation: mutation.clone(),
    });

    let mut builder = Schema::build(&query, mutation.as_deref(), None);

    for ty in resolver.registry.types.values() {
        // The schema builder brings its own built-in scalars and introspection types.
        if BUILTIN_SCALARS.contains(&ty.name.as_str()) || ty.name.starts_with("__") {
            continue;
        }

        builder = match &ty.kind {
            TypeDefKind::Scalar => builder.register(scalar(ty)),
            TypeDefKind::Object(composite) => {
                let mut object = Object::new(&ty.name);

                if let Some(description) = &ty.description {
                    object = object.description(description);
                }

                for interface in &composite.implements {
                    object = object.implement(&interface.node);
                }

                for field in composite.fields.values() {
                    object = object.field(output_field(&resolver, &ty.name, field));
                }

                builder.register(object)
            }
            TypeDefKind::Interface(composite) => {
                let mut interface = Interface::new(&ty.name);

                if let Some(description) = &ty.description {
                    interface = interface.description(description);
                }

                for implemented in &composite.implements {
                    interface = interface.implement(&implemented.node);
                }

                for field in composite.fields.values() {
                    let mut interface_field = InterfaceField::new(&field.name, type_ref(&field.ty.node));

                    if let Some(description) = &field.description {
                        interface_field = interface_field.description(description);
                    }

                    for argument in field.arguments.values() {
                        interface_field = interface_field.argument(input_value(argument));
                    }

                    interface = interface.field(interface_field);
                }

                builder.register(interface)
            }
            TypeDefKind::Union(members) => {
                let mut union = Union::new(&ty.name);

                if let Some(description) = &ty.description {
                    union = union.description(description);
                }

                for member in members {
                    union = union.possible_type(&member.node);
                }

                builder.register(union)
            }
            TypeDefKind::Enum(values) => {
                let mut enum_type = Enum::new(&ty.name);

                if let Some(description) = &ty.description {
                    enum_type = enum_type.description(description);
                }

                for value in values.values() {
                    let mut item = EnumItem::new(&value.name);

                    if let Some(description) = &value.description {
                        item = item.description(description);
                    }

                    if let Some(reason) = deprecation(&value.directives) {
                        item = item.deprecation(Some(reason.as_str()));
                    }

                    enum_type = enum_type.item(item);
                }

                builder.register(enum_type)
            }
            TypeDefKind::InputObject(fields) => {
                let mut input = InputObject::new(&ty.name);

                if let Some(description) = &ty.description {
                    input = input.description(description);
                }

                for field in fields.values() {
                    input = input.field(input_value(field));
                }

                builder.register(input)
            }
        };
    }

    builder.finish()
}

fn scalar(ty: &TypeDef) -> Scalar {
    let mut scalar = Scalar::new(&ty.name);

    if let Some(description) = &ty.description {
        scalar = scalar.description(description);
    }

    if let Some(ConstValue::String(url)) = directive_argument(&ty.directives, "specifiedBy", "url") {
        scalar = scalar.specified_by_url(url);
    }

    scalar
}

fn output_field(resolver: &Arc<Resolver>, type_name: &str, definition: &FieldDef) -> Field {
    let resolver = Arc::clone(resolver);
    let type_name = type_name.to_owned();
    let field_name = definition.name.clone();

    let mut field = Field::new(&definition.name, type_ref(&definition.ty.node), move |ctx| {
        let resolver = Arc::clone(&resolver);
        let type_name = type_name.clone();
        let field_name = field_name.clone();

        FieldFuture::new(async move { resolver.resolve(&type_name, &field_name, ctx).await })
    });

    if let Some(description) = &definition.description {
        field = field.description(description);
    }

    if let Some(reason) = deprecation(&definition.directives) {
        field = field.deprecation(Some(reason.as_str()));
    }

    for argument in definition.arguments.values() {
        field = field.argument(input_value(argument));
    }

    field
}

fn input_value(definition: &InputValueDef) -> InputValue {
    let mut value = InputValue::new(&definition.name, type_ref(&definition.ty.node));

    if let Some(description) = &definition.description {
        value = value.description(description);
    }

    if let Some(default_value) = &definition.default_value {
        value = value.default_value(default_value.clone());
    }

    value
}

fn type_ref(ty: &ast::Type) -> TypeRef {
    let base = match &ty.base {
        ast::BaseType::Named(name) => TypeRef::Named(name.to_string().into()),
        ast::BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };

    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

fn deprecation(directives: &Directives) -> Option<String> {
    if !has_directive(directives, "deprecated") {
        return None;
    }

    match directive_argument(directives, "deprecated", "reason") {
        Some(ConstValue::String(reason)) => Some(reason.clone()),
        _ => Some(DEFAULT_DEPRECATION.to_owned()),
    }
}

impl Resolver {
    async fn resolve<'a>(
        &self,
        type_name: &str,
        field_name: &str,
        ctx: ResolverContext<'a>,
    ) -> async_graphql::Result<Option<FieldValue<'a>>> {
        let Some(field) = self.registry.types.get(type_name).and_then(|ty| ty.field(field_name)) else {
            return Ok(None);
        };

        let selection = ctx.ctx.field();
        let response_key = selection.alias().unwrap_or(field_name);

        match ctx.parent_value.try_downcast_ref::<Node>() {
            Ok(node) if node.source == Source::Remote && field.origin != Origin::User => {
                let value = node.data.get(response_key).cloned().unwrap_or(Value::Null);
                return Ok(Some(self.field_value(&field.ty.node, value, Source::Remote)));
            }
            Ok(node) => {
                let seeded = node.data.get(response_key).or_else(|| node.data.get(field_name));

                if let Some(value) = seeded {
                    return Ok(Some(self.field_value(&field.ty.node, value.clone(), Source::Fake)));
                }
            }
            Err(_) if field.origin == Origin::Remote => {
                if let Some(upstream) = &self.upstream {
                    let operation = if self.is_mutation(type_name) { "mutation" } else { "query" };
                    let document = proxy::print_operation(&self.registry, operation, type_name, &selection)?;

                    let mut data = match upstream.execute(&document).await {
                        Ok(data) => data,
                        // A nullable field that failed upstream is answered with null and its error.
                        Err(error) if field.ty.node.nullable => {
                            let error =
                                async_graphql::Error::new(error.to_string()).into_server_error(ctx.ctx.item.pos);
                            ctx.ctx.add_error(ctx.ctx.set_error_path(error));

                            return Ok(Some(FieldValue::NULL));
                        }
                        Err(error) => return Err(error.into()),
                    };

                    let value = data.remove(response_key).unwrap_or(Value::Null);

                    return Ok(Some(self.field_value(&field.ty.node, value, Source::Remote)));
                }
            }
            Err(_) => (),
        }

        let seed = if self.is_mutation(type_name) {
            Some(mutation_seed(&ctx)?)
        } else {
            None
        };

        let value = self.fake_field(field, seed.as_ref());

        Ok(Some(self.field_value(&field.ty.node, value, Source::Fake)))
    }

    fn is_mutation(&self, type_name: &str) -> bool {
        self.mutation.as_deref() == Some(type_name)
    }

    fn fake_field(&self, field: &FieldDef, seed: Option<&Map<String, Value>>) -> Value {
        let mut rng = rand::thread_rng();
        self.fake_value(&field.ty.node, field, seed, &mut rng)
    }

    fn fake_value(
        &self,
        ty: &ast::Type,
        field: &FieldDef,
        seed: Option<&Map<String, Value>>,
        rng: &mut impl Rng,
    ) -> Value {
        match &ty.base {
            ast::BaseType::List(inner) => {
                let (min, max) = list_length(&field.directives);
                let length = rng.gen_range(min..=max);

                (0..length)
                    .map(|_| self.fake_value(inner, field, seed, rng))
                    .collect::<Vec<_>>()
                    .into()
            }
            ast::BaseType::Named(type_name) => self.fake_named(type_name, field, seed, rng),
        }
    }

    /// Picks a value by the first rule that applies: field examples, field
    /// generator, type examples, type generator, then the default for the kind.
    fn fake_named(
        &self,
        type_name: &str,
        field: &FieldDef,
        seed: Option<&Map<String, Value>>,
        rng: &mut impl Rng,
    ) -> Value {
        let ty = self.registry.types.get(type_name);

        let chosen = example(&field.directives, rng)
            .or_else(|| generated(&field.directives, rng))
            .or_else(|| ty.and_then(|ty| example(&ty.directives, rng)))
            .or_else(|| ty.and_then(|ty| generated(&ty.directives, rng)));

        let Some(ty) = ty else {
            return chosen.unwrap_or(Value::Null);
        };

        match (&ty.kind, chosen) {
            (TypeDefKind::Scalar | TypeDefKind::Enum(_), Some(value)) => value,
            (TypeDefKind::Scalar, None) => default_leaf(type_name, rng),
            (TypeDefKind::Enum(values), None) => {
                let names: Vec<_> = values.keys().collect();

                if names.is_empty() {
                    Value::Null
                } else {
                    Value::String(fake::pick(rng, &names).to_string())
                }
            }
            (_, chosen) => {
                let mut data = seed.cloned().unwrap_or_default();

                if let Some(Value::Object(example)) = chosen {
                    data.extend(example);
                }

                Value::Object(data)
            }
        }
    }

    fn field_value(&self, ty: &ast::Type, value: Value, source: Source) -> FieldValue<'static> {
        if value.is_null() {
            return FieldValue::NULL;
        }

        match &ty.base {
            ast::BaseType::List(inner) => {
                let items = match value {
                    Value::Array(items) => items,
                    other => vec![other],
                };

                FieldValue::list(items.into_iter().map(|item| self.field_value(inner, item, source)))
            }
            ast::BaseType::Named(type_name) => self.named_field_value(type_name, value, source),
        }
    }

    fn named_field_value(&self, type_name: &str, value: Value, source: Source) -> FieldValue<'static> {
        let Some(ty) = self.registry.types.get(type_name) else {
            return FieldValue::NULL;
        };

        match &ty.kind {
            TypeDefKind::Enum(_) => match value {
                Value::String(name) => FieldValue::value(ConstValue::Enum(Name::new(name))),
                other => leaf(other),
            },
            TypeDefKind::Scalar => leaf(value),
            TypeDefKind::Object(_) => FieldValue::owned_any(Node::new(source, value)),
            TypeDefKind::Interface(_) | TypeDefKind::Union(_) => {
                let node = Node::new(source, value);

                match self.concrete_type(type_name, &node) {
                    Some(concrete) => FieldValue::owned_any(node).with_type(concrete),
                    None => FieldValue::NULL,
                }
            }
            TypeDefKind::InputObject(_) => FieldValue::NULL,
        }
    }

    /// The object type an abstract value stands for: its `__typename` when it
    /// names a possible type, otherwise a random possible type.
    fn concrete_type(&self, abstract_type: &str, node: &Node) -> Option<String> {
        let possible_types = self.registry.possible_types(abstract_type);

        if let Some(Value::String(typename)) = node.data.get("__typename") {
            if possible_types.contains(&typename.as_str()) {
                return Some(typename.clone());
            }
        }

        if possible_types.is_empty() {
            return None;
        }

        let mut rng = rand::thread_rng();
        Some(fake::pick(&mut rng, &possible_types).to_string())
    }
}

/// The values a mutation result starts from: its arguments, or the fields of
/// its `input` argument when that is the only one.
fn mutation_seed(ctx: &ResolverContext<'_>) -> async_graphql::Result<Map<String, Value>> {
    let arguments = ctx.args.as_index_map();
    let mut seed = Map::new();

    if let (1, Some(ConstValue::Object(input))) = (arguments.len(), arguments.get("input")) {
        for (name, value) in input {
            seed.insert(name.to_string(), value.clone().into_json()?);
        }

        return Ok(seed);
    }

    for (name, value) in arguments {
        seed.insert(name.to_string(), value.clone().into_json()?);
    }

    Ok(seed)
}

fn leaf(value: Value) -> FieldValue<'static> {
    match ConstValue::from_json(value) {
        Ok(value) => FieldValue::value(value),
        Err(_) => FieldValue::NULL,
    }
}

fn default_leaf(type_name: &str, rng: &mut impl Rng) -> Value {
    match type_name {
        "Int" => fake::int(rng),
        "Float" => fake::float(rng),
        "Boolean" => fake::boolean(rng),
        "ID" => fake::id(rng),
        _ => fake::string(rng),
    }
}

fn example(directives: &Directives, rng: &mut impl Rng) -> Option<Value> {
    let Some(ConstValue::List(values)) = directive_argument(directives, "examples", "values") else {
        return None;
    };

    if values.is_empty() {
        return None;
    }

    let value = fake::pick(rng, values).clone().into_json().ok()?;

    // A list example on a list field still yields one item per generated entry.
    match value {
        Value::Array(items) if !items.is_empty() => Some(fake::pick(rng, &items).clone()),
        value => Some(value),
    }
}

fn generated(directives: &Directives, rng: &mut impl Rng) -> Option<Value> {
    match directive_argument(directives, "fake", "type") {
        Some(ConstValue::Enum(fake_type)) => Some(fake::fake(fake_type.as_str(), rng)),
        _ => None,
    }
}

fn list_length(directives: &Directives) -> (u64, u64) {
    let bound = |argument| directive_argument(directives, "listLength", argument).and_then(as_length);

    match (bound("min"), bound("max")) {
        (Some(min), Some(max)) if min <= max => (min, max),
        _ => DEFAULT_LIST_LENGTH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(sdl: &str) -> ast::Type {
        ast::Type::new(sdl).unwrap()
    }

    #[test]
    fn wrapping_types_are_kept() {
        assert_eq!("[String!]!", type_ref(&ty("[String!]!")).to_string());
        assert_eq!("[[Int]]", type_ref(&ty("[[Int]]")).to_string());
        assert_eq!("User", type_ref(&ty("User")).to_string());
    }
}
