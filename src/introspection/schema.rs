//! Client-side schema built from an introspection response.
//!
//! The `__schema` payload is decoded, encoded to SDL, and handed to the GraphQL
//! compiler, so consumers get both the printable SDL and a queryable
//! [`apollo_compiler::Schema`].

use apollo_compiler::Schema;
use apollo_encoder::{
    Argument, Directive, DirectiveDefinition, Document as SDL, EnumDefinition, EnumValue,
    FieldDefinition, InputField, InputObjectDefinition, InputValueDefinition, InterfaceDefinition,
    ObjectDefinition, ScalarDefinition, SchemaDefinition, Type_, UnionDefinition, Value,
};
use serde::Deserialize;

// Types every GraphQL schema provides; never encoded to SDL.
const GRAPHQL_NAMED_TYPES: [&str; 13] = [
    "__Schema",
    "__Type",
    "__TypeKind",
    "__Field",
    "__InputValue",
    "__EnumValue",
    "__DirectiveLocation",
    "__Directive",
    "Boolean",
    "Float",
    "String",
    "Int",
    "ID",
];

// Directives the compiler defines itself; never encoded to SDL.
const SPECIFIED_DIRECTIVES: [&str; 5] = ["skip", "include", "deprecated", "specifiedBy", "oneOf"];

const SOURCE_NAME: &str = "introspection.graphql";

#[derive(thiserror::Error, Debug)]
pub enum SchemaBuildError {
    #[error("introspection data does not describe a schema: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("a {0} type reference is missing its {1}")]
    IncompleteTypeRef(&'static str, &'static str),
    #[error("introspection data uses an unknown type kind")]
    UnknownTypeKind,
    #[error("introspection data describes an invalid schema: {0}")]
    Sdl(String),
}

#[derive(Debug, Deserialize)]
struct IntrospectionData {
    #[serde(rename = "__schema")]
    schema: IntrospectionSchema,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionSchema {
    query_type: Option<NamedRef>,
    mutation_type: Option<NamedRef>,
    subscription_type: Option<NamedRef>,
    types: Vec<FullType>,
    #[serde(default)]
    directives: Vec<DirectiveDef>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullType {
    kind: TypeKind,
    name: Option<String>,
    description: Option<String>,
    fields: Option<Vec<FieldDef>>,
    input_fields: Option<Vec<InputValueDef>>,
    interfaces: Option<Vec<TypeRef>>,
    enum_values: Option<Vec<EnumValueDef>>,
    possible_types: Option<Vec<TypeRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldDef {
    name: String,
    description: Option<String>,
    #[serde(default)]
    args: Vec<InputValueDef>,
    #[serde(rename = "type")]
    type_: TypeRef,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputValueDef {
    name: String,
    description: Option<String>,
    #[serde(rename = "type")]
    type_: TypeRef,
    default_value: Option<String>,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnumValueDef {
    name: String,
    description: Option<String>,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectiveDef {
    name: String,
    description: Option<String>,
    #[serde(default)]
    locations: Vec<String>,
    #[serde(default)]
    args: Vec<InputValueDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeRef {
    kind: TypeKind,
    name: Option<String>,
    of_type: Option<Box<TypeRef>>,
}

/// A schema as described by an endpoint's introspection response
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    sdl: String,
    schema: Schema,
    query_type: Option<String>,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    type_names: Vec<String>,
}

impl SchemaDocument {
    /// Builds the schema from the `data` member of an introspection response
    pub fn from_introspection(data: serde_json::Value) -> Result<SchemaDocument, SchemaBuildError> {
        let IntrospectionData { schema } = serde_json::from_value(data)?;
        let query_type = schema.query_type.as_ref().map(|t| t.name.clone());
        let mutation_type = schema.mutation_type.as_ref().map(|t| t.name.clone());
        let subscription_type = schema.subscription_type.as_ref().map(|t| t.name.clone());
        let type_names = schema
            .types
            .iter()
            .filter_map(|t| t.name.clone())
            .filter(|name| !GRAPHQL_NAMED_TYPES.contains(&name.as_str()))
            .collect();

        let sdl = schema.encode()?;
        let schema = Schema::parse(sdl.as_str(), SOURCE_NAME)
            .map_err(|invalid| SchemaBuildError::Sdl(invalid.errors.to_string()))?;
        Ok(SchemaDocument {
            sdl,
            schema,
            query_type,
            mutation_type,
            subscription_type,
            type_names,
        })
    }

    pub fn sdl(&self) -> &str {
        &self.sdl
    }

    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn query_type(&self) -> Option<&str> {
        self.query_type.as_deref()
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_deref()
    }

    /// Names of the schema's own types, in introspection order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.type_names.iter().map(String::as_str)
    }
}

impl PartialEq for SchemaDocument {
    fn eq(&self, other: &Self) -> bool {
        self.sdl == other.sdl
    }
}

impl IntrospectionSchema {
    fn encode(self) -> Result<String, SchemaBuildError> {
        let mut sdl = SDL::new();

        // A schema definition is only needed when the roots differ from the
        // conventional `Query`/`Mutation`/`Subscription` lookup.
        if self.mutation_type.is_some() || self.subscription_type.is_some() {
            let mut schema_def = SchemaDefinition::new();
            if let Some(mutation_type) = self.mutation_type {
                schema_def.mutation(mutation_type.name);
            }
            if let Some(subscription_type) = self.subscription_type {
                schema_def.subscription(subscription_type.name);
            }
            if let Some(query_type) = self.query_type {
                schema_def.query(query_type.name);
            }
            sdl.schema(schema_def);
        } else if let Some(query_type) = self.query_type {
            if query_type.name != "Query" {
                let mut schema_def = SchemaDefinition::new();
                schema_def.query(query_type.name);
                sdl.schema(schema_def);
            }
        }

        for directive in self
            .directives
            .into_iter()
            .filter(|directive| !SPECIFIED_DIRECTIVES.contains(&directive.name.as_str()))
        {
            encode_directive(directive, &mut sdl)?;
        }

        for type_ in self.types.into_iter().filter(|type_| match type_.name.as_deref() {
            Some(name) => !GRAPHQL_NAMED_TYPES.contains(&name),
            None => false,
        }) {
            encode_full_type(type_, &mut sdl)?;
        }

        Ok(sdl.to_string())
    }
}

fn encode_directive(directive: DirectiveDef, sdl: &mut SDL) -> Result<(), SchemaBuildError> {
    let mut directive_ = DirectiveDefinition::new(directive.name);
    if let Some(desc) = directive.description {
        directive_.description(desc);
    }
    for arg in directive.args {
        directive_.arg(encode_arg(arg)?);
    }
    for location in directive.locations {
        directive_.location(location);
    }
    sdl.directive(directive_);
    Ok(())
}

fn encode_full_type(type_: FullType, sdl: &mut SDL) -> Result<(), SchemaBuildError> {
    let name = type_.name.unwrap_or_default();
    match type_.kind {
        TypeKind::Object => {
            let mut object_def = ObjectDefinition::new(name);
            if let Some(desc) = type_.description {
                object_def.description(desc);
            }
            for interface in type_.interfaces.unwrap_or_default() {
                object_def.interface(named(interface)?);
            }
            if let Some(fields) = type_.fields.filter(|fields| !fields.is_empty()) {
                for field in fields {
                    object_def.field(encode_field(field)?);
                }
                sdl.object(object_def);
            }
        }
        TypeKind::InputObject => {
            let mut input_def = InputObjectDefinition::new(name);
            if let Some(desc) = type_.description {
                input_def.description(desc);
            }
            if let Some(fields) = type_.input_fields.filter(|fields| !fields.is_empty()) {
                for field in fields {
                    input_def.field(encode_input_field(field)?);
                }
                sdl.input_object(input_def);
            }
        }
        TypeKind::Interface => {
            let mut interface_def = InterfaceDefinition::new(name);
            if let Some(desc) = type_.description {
                interface_def.description(desc);
            }
            for interface in type_.interfaces.unwrap_or_default() {
                interface_def.interface(named(interface)?);
            }
            if let Some(fields) = type_.fields.filter(|fields| !fields.is_empty()) {
                for field in fields {
                    interface_def.field(encode_field(field)?);
                }
                sdl.interface(interface_def);
            }
        }
        TypeKind::Scalar => {
            let mut scalar_def = ScalarDefinition::new(name);
            if let Some(desc) = type_.description {
                scalar_def.description(desc);
            }
            sdl.scalar(scalar_def);
        }
        TypeKind::Union => {
            let mut union_def = UnionDefinition::new(name);
            if let Some(desc) = type_.description {
                union_def.description(desc);
            }
            for possible_type in type_.possible_types.unwrap_or_default() {
                union_def.member(named(possible_type)?);
            }
            sdl.union(union_def);
        }
        TypeKind::Enum => {
            let mut enum_def = EnumDefinition::new(name);
            if let Some(desc) = type_.description {
                enum_def.description(desc);
            }
            for value in type_.enum_values.unwrap_or_default() {
                let mut enum_value = EnumValue::new(value.name);
                if let Some(desc) = value.description {
                    enum_value.description(desc);
                }
                if value.is_deprecated {
                    enum_value.directive(deprecated_directive(value.deprecation_reason));
                }
                enum_def.value(enum_value);
            }
            sdl.enum_(enum_def);
        }
        TypeKind::List | TypeKind::NonNull => {
            return Err(SchemaBuildError::IncompleteTypeRef("wrapping", "named type"));
        }
        TypeKind::Unknown => return Err(SchemaBuildError::UnknownTypeKind),
    }
    Ok(())
}

fn encode_field(field: FieldDef) -> Result<FieldDefinition, SchemaBuildError> {
    let mut field_def = FieldDefinition::new(field.name, encode_type(field.type_)?);
    for arg in field.args {
        field_def.arg(encode_arg(arg)?);
    }
    if field.is_deprecated {
        field_def.directive(deprecated_directive(field.deprecation_reason));
    }
    if let Some(desc) = field.description {
        field_def.description(desc);
    }
    Ok(field_def)
}

fn encode_input_field(field: InputValueDef) -> Result<InputField, SchemaBuildError> {
    let mut field_def = InputField::new(field.name, encode_type(field.type_)?);
    if let Some(default_value) = field.default_value {
        field_def.default_value(default_value);
    }
    if let Some(desc) = field.description {
        field_def.description(desc);
    }
    if field.is_deprecated {
        field_def.directive(deprecated_directive(field.deprecation_reason));
    }
    Ok(field_def)
}

fn encode_arg(value: InputValueDef) -> Result<InputValueDefinition, SchemaBuildError> {
    let mut value_def = InputValueDefinition::new(value.name, encode_type(value.type_)?);
    if let Some(default_value) = value.default_value {
        value_def.default_value(default_value);
    }
    if let Some(desc) = value.description {
        value_def.description(desc);
    }
    if value.is_deprecated {
        value_def.directive(deprecated_directive(value.deprecation_reason));
    }
    Ok(value_def)
}

fn encode_type(ty: TypeRef) -> Result<Type_, SchemaBuildError> {
    match ty.kind {
        TypeKind::NonNull => {
            let inner = ty
                .of_type
                .ok_or(SchemaBuildError::IncompleteTypeRef("NON_NULL", "ofType"))?;
            Ok(Type_::NonNull {
                ty: Box::new(encode_type(*inner)?),
            })
        }
        TypeKind::List => {
            let inner = ty
                .of_type
                .ok_or(SchemaBuildError::IncompleteTypeRef("LIST", "ofType"))?;
            Ok(Type_::List {
                ty: Box::new(encode_type(*inner)?),
            })
        }
        TypeKind::Unknown => Err(SchemaBuildError::UnknownTypeKind),
        _ => Ok(Type_::NamedType { name: named(ty)? }),
    }
}

fn named(ty: TypeRef) -> Result<String, SchemaBuildError> {
    ty.name
        .ok_or(SchemaBuildError::IncompleteTypeRef("named", "name"))
}

fn deprecated_directive(reason: Option<String>) -> Directive {
    let mut directive = Directive::new(String::from("deprecated"));
    if let Some(reason) = reason {
        directive.arg(Argument::new(String::from("reason"), Value::String(reason)));
    }
    directive
}
