use std::str::FromStr;

use loot_condition_interpreter::Expression;
use saphyr::{AnnotatedHash, MarkedYaml, Marker, Scalar, Yaml, YamlData};

use super::super::error::{ExpectedType, MetadataParsingErrorReason, ParseMetadataError};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum YamlObjectType {
    File,
    Group,
    Location,
    Message,
    MessageContent,
    PluginCleaningData,
    PluginMetadata,
    Tag,
    MetadataDocument,
    BashTagsElement,
}

impl std::fmt::Display for YamlObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YamlObjectType::File => write!(f, "file"),
            YamlObjectType::Group => write!(f, "group"),
            YamlObjectType::Location => write!(f, "location"),
            YamlObjectType::Message => write!(f, "message"),
            YamlObjectType::MessageContent => write!(f, "message content"),
            YamlObjectType::PluginCleaningData => write!(f, "plugin cleaning data"),
            YamlObjectType::PluginMetadata => write!(f, "plugin metadata"),
            YamlObjectType::Tag => write!(f, "tag"),
            YamlObjectType::MetadataDocument => write!(f, "metadata document"),
            YamlObjectType::BashTagsElement => write!(f, "bash tags"),
        }
    }
}

pub fn to_unmarked_yaml(yaml: &MarkedYaml) -> Yaml {
    match &yaml.data {
        YamlData::Value(v) => Yaml::Value(v.clone()),
        YamlData::Sequence(v) => Yaml::Sequence(v.iter().map(to_unmarked_yaml).collect()),
        YamlData::Mapping(v) => Yaml::Mapping(
            v.iter()
                .map(|(key, value)| (to_unmarked_yaml(key), to_unmarked_yaml(value)))
                .collect(),
        ),
        YamlData::Alias(v) => Yaml::Alias(*v),
        YamlData::BadValue => Yaml::BadValue,
    }
}

pub fn as_string_node(value: &str) -> MarkedYaml {
    MarkedYaml {
        span: saphyr_parser::Span::default(),
        data: YamlData::Value(Scalar::String(value.into())),
    }
}

pub fn get_string_value<'a>(
    hash: &'a AnnotatedHash<MarkedYaml>,
    key: &'static str,
    yaml_type: YamlObjectType,
) -> Result<Option<(Marker, &'a str)>, ParseMetadataError> {
    match hash.get(&as_string_node(key)) {
        Some(n) => match &n.data {
            YamlData::Value(Scalar::String(s)) => Ok(Some((n.span.start, s.as_str()))),
            _ => Err(ParseMetadataError::unexpected_value_type(
                n.span.start,
                key,
                yaml_type,
                ExpectedType::String,
            )),
        },
        None => Ok(None),
    }
}

pub fn get_required_string_value<'a>(
    marker: Marker,
    hash: &'a AnnotatedHash<MarkedYaml>,
    key: &'static str,
    yaml_type: YamlObjectType,
) -> Result<&'a str, ParseMetadataError> {
    match get_string_value(hash, key, yaml_type)? {
        Some(n) => Ok(n.1),
        None => Err(ParseMetadataError::missing_key(marker, key, yaml_type)),
    }
}

pub fn get_strings_vec_value<'a>(
    hash: &'a AnnotatedHash<MarkedYaml>,
    key: &'static str,
    yaml_type: YamlObjectType,
) -> Result<Vec<&'a str>, ParseMetadataError> {
    match hash.get(&as_string_node(key)) {
        Some(n) => match &n.data {
            YamlData::Sequence(a) => a
                .iter()
                .map(|e| match &e.data {
                    YamlData::Value(Scalar::String(s)) => Ok(s.as_str()),
                    _ => Err(ParseMetadataError::unexpected_value_type(
                        e.span.start,
                        key,
                        yaml_type,
                        ExpectedType::String,
                    )),
                })
                .collect::<Result<Vec<_>, _>>(),
            _ => Err(ParseMetadataError::unexpected_value_type(
                n.span.start,
                key,
                yaml_type,
                ExpectedType::Array,
            )),
        },
        None => Ok(Vec::new()),
    }
}

pub fn get_as_hash(
    value: &MarkedYaml,
    yaml_type: YamlObjectType,
) -> Result<&AnnotatedHash<MarkedYaml>, ParseMetadataError> {
    match &value.data {
        YamlData::Mapping(h) => Ok(h),
        _ => Err(ParseMetadataError::unexpected_type(
            value.span.start,
            yaml_type,
            ExpectedType::Map,
        )),
    }
}

/// A trait for types that can be parsed from a [`MarkedYaml`] node, giving
/// positional errors if the node is the wrong shape.
pub trait TryFromYaml: Sized {
    fn try_from_yaml(value: &MarkedYaml) -> Result<Self, ParseMetadataError>;
}

pub fn get_value<'a>(
    hash: &'a AnnotatedHash<MarkedYaml>,
    key: &'static str,
) -> Option<&'a MarkedYaml> {
    hash.get(&as_string_node(key))
}

pub fn get_u32_value(
    hash: &AnnotatedHash<MarkedYaml>,
    key: &'static str,
    yaml_type: YamlObjectType,
) -> Result<Option<u32>, ParseMetadataError> {
    match hash.get(&as_string_node(key)) {
        Some(n) => match &n.data {
            YamlData::Value(Scalar::Integer(i)) => i.to_owned().try_into().map(Some).map_err(|_| {
                ParseMetadataError::new(n.span.start, MetadataParsingErrorReason::NonU32Number(*i))
            }),
            _ => Err(ParseMetadataError::unexpected_value_type(
                n.span.start,
                key,
                yaml_type,
                ExpectedType::Number,
            )),
        },
        None => Ok(None),
    }
}

pub fn get_as_slice<'a>(
    hash: &'a AnnotatedHash<MarkedYaml>,
    key: &'static str,
    yaml_type: YamlObjectType,
) -> Result<&'a [MarkedYaml], ParseMetadataError> {
    if let Some(value) = hash.get(&as_string_node(key)) {
        match &value.data {
            YamlData::Sequence(n) => Ok(n.as_slice()),
            _ => Err(ParseMetadataError::unexpected_value_type(
                value.span.start,
                key,
                yaml_type,
                ExpectedType::Array,
            )),
        }
    } else {
        Ok(&[])
    }
}

pub fn parse_condition(
    hash: &AnnotatedHash<MarkedYaml>,
    key: &'static str,
    yaml_type: YamlObjectType,
) -> Result<Option<String>, ParseMetadataError> {
    match get_string_value(hash, key, yaml_type)? {
        Some((marker, s)) => {
            let s = s.to_string();
            if let Err(e) = Expression::from_str(&s) {
                return Err(ParseMetadataError::invalid_condition(marker, s, e));
            }
            Ok(Some(s))
        }
        None => Ok(None),
    }
}
