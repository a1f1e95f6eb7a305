mod emit;
mod merge;
mod parse;

pub use emit::{EmitYaml, YamlEmitter};
pub use merge::process_merge_keys;
pub use parse::{
    TryFromYaml, YamlObjectType, as_string_node, get_as_hash, get_as_slice,
    get_required_string_value, get_string_value, get_strings_vec_value, get_u32_value, get_value,
    parse_condition, to_unmarked_yaml,
};
