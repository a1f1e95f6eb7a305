use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::Arc,
};

use saphyr::{LoadableYamlNode, MarkedYaml, Scalar, YamlData};

use crate::{escape_ascii, logging, metadata::error::MetadataParsingErrorReason};

use super::{
    error::{
        ExpectedType, LoadMetadataError, MetadataDocumentParsingError, ParseMetadataError,
        RegexError, WriteMetadataError,
    },
    file::Filename,
    group::Group,
    message::Message,
    plugin_metadata::PluginMetadata,
    yaml::{EmitYaml, TryFromYaml, YamlEmitter, YamlObjectType, get_as_slice, process_merge_keys},
};

/// Options to configure how metadata files are written.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetadataWriteOptions {
    truncate: bool,
}

impl MetadataWriteOptions {
    /// Creates a new set of options, all initially set to `false`.
    pub fn new() -> Self {
        MetadataWriteOptions { truncate: false }
    }

    /// Sets the option to overwrite the output file if it already exists.
    ///
    /// If true and the file path already exists, its contents will be replaced.
    ///
    /// If false and the file path already exists, an error will be returned.
    ///
    /// This setting has no effect if the file path does not exist.
    pub fn set_truncate(&mut self, truncate: bool) {
        self.truncate = truncate;
    }

    /// Gets the current value of the `truncate` option.
    pub fn truncate(&self) -> bool {
        self.truncate
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MetadataDocument {
    bash_tags: Vec<String>,
    groups: Vec<Group>,
    messages: Vec<Message>,
    plugins: HashMap<Arc<Filename>, PluginMetadata>,
    regex_plugins: Vec<PluginMetadata>,
    ordered_plugin_names: Vec<Arc<Filename>>,
}

impl MetadataDocument {
    pub(crate) fn load(&mut self, file_path: &Path) -> Result<(), LoadMetadataError> {
        if !file_path.exists() {
            return Err(LoadMetadataError::new(
                file_path.into(),
                MetadataDocumentParsingError::PathNotFound,
            ));
        }

        logging::trace!("Loading file at \"{}\"", escape_ascii(file_path));

        let content = std::fs::read_to_string(file_path)
            .map_err(|e| LoadMetadataError::from_io_error(file_path.into(), e))?;

        self.load_from_str(&content)
            .map_err(|e| LoadMetadataError::new(file_path.into(), e))?;

        logging::trace!(
            "Successfully loaded metadata from file at \"{}\".",
            escape_ascii(file_path)
        );

        Ok(())
    }

    pub(crate) fn load_with_prelude(
        &mut self,
        masterlist_path: &Path,
        prelude_path: &Path,
    ) -> Result<(), LoadMetadataError> {
        if !masterlist_path.exists() {
            return Err(LoadMetadataError::new(
                masterlist_path.into(),
                MetadataDocumentParsingError::PathNotFound,
            ));
        }

        if !prelude_path.exists() {
            return Err(LoadMetadataError::new(
                prelude_path.into(),
                MetadataDocumentParsingError::PathNotFound,
            ));
        }

        let masterlist = std::fs::read_to_string(masterlist_path)
            .map_err(|e| LoadMetadataError::from_io_error(masterlist_path.into(), e))?;

        let prelude = std::fs::read_to_string(prelude_path)
            .map_err(|e| LoadMetadataError::from_io_error(masterlist_path.into(), e))?;

        let masterlist = replace_prelude(masterlist, &prelude).map_err(|e| {
            LoadMetadataError::new(
                masterlist_path.into(),
                MetadataDocumentParsingError::MetadataParsingError(e),
            )
        })?;

        self.load_from_str(&masterlist.masterlist)
            .map_err(|mut e| {
                match &mut e {
                    MetadataDocumentParsingError::MetadataParsingError(err) => {
                        if let Some(meta) = masterlist.meta {
                            err.adjust_location(&meta);
                        }
                    }
                    MetadataDocumentParsingError::YamlMergeKeyError(err) => {
                        if let Some(meta) = masterlist.meta {
                            err.adjust_location(&meta);
                        }
                    }
                    _ => {
                        // No location to adjust.
                    }
                }
                LoadMetadataError::new(masterlist_path.into(), e)
            })?;

        logging::trace!(
            "Successfully loaded metadata from file at \"{}\".",
            escape_ascii(masterlist_path)
        );

        Ok(())
    }

    fn load_from_str(&mut self, string: &str) -> Result<(), MetadataDocumentParsingError> {
        let mut docs = MarkedYaml::load_from_str(string)?;

        let doc = docs
            .pop()
            .ok_or_else(|| MetadataDocumentParsingError::NoDocuments)?;

        if !docs.is_empty() {
            return Err(MetadataDocumentParsingError::MoreThanOneDocument(
                docs.len() + 1,
            ));
        }

        let doc = process_merge_keys(doc)?;

        let YamlData::Mapping(doc) = doc.data else {
            return Err(ParseMetadataError::unexpected_type(
                doc.span.start,
                YamlObjectType::MetadataDocument,
                ExpectedType::Map,
            )
            .into());
        };

        let mut plugins = HashMap::new();
        let mut regex_plugins = Vec::new();
        let mut ordered_plugin_names = Vec::new();
        for plugin_yaml in get_as_slice(&doc, "plugins", YamlObjectType::MetadataDocument)? {
            let plugin = PluginMetadata::try_from_yaml(plugin_yaml)?;
            let filename = Arc::new(Filename::new(plugin.name().to_owned()));

            if plugin.is_regex_plugin() {
                regex_plugins.push(plugin);
            } else if let Some(old) = plugins.insert(Arc::clone(&filename), plugin) {
                return Err(ParseMetadataError::duplicate_entry(
                    plugin_yaml.span.start,
                    old.name().to_owned(),
                    YamlObjectType::PluginMetadata,
                )
                .into());
            }

            ordered_plugin_names.push(filename);
        }

        let messages = get_as_slice(&doc, "globals", YamlObjectType::MetadataDocument)?
            .iter()
            .map(Message::try_from_yaml)
            .collect::<Result<Vec<_>, _>>()?;

        let mut bash_tags = Vec::new();
        for bash_tag_yaml in get_as_slice(&doc, "bash_tags", YamlObjectType::MetadataDocument)? {
            let bash_tag: &str = match &bash_tag_yaml.data {
                YamlData::Value(Scalar::String(b)) => b,
                _ => {
                    return Err(ParseMetadataError::unexpected_type(
                        bash_tag_yaml.span.start,
                        YamlObjectType::BashTagsElement,
                        ExpectedType::String,
                    )
                    .into());
                }
            };

            bash_tags.push(bash_tag.to_owned());
        }

        let mut group_names = HashSet::new();
        let mut groups = Vec::new();
        for group_yaml in get_as_slice(&doc, "groups", YamlObjectType::MetadataDocument)? {
            let group = Group::try_from_yaml(group_yaml)?;

            let name = group.name().to_owned();
            if group_names.contains(&name) {
                return Err(ParseMetadataError::duplicate_entry(
                    group_yaml.span.start,
                    group.name().to_owned(),
                    YamlObjectType::Group,
                )
                .into());
            }

            groups.push(group);
            group_names.insert(name);
        }

        if !group_names.contains(Group::DEFAULT_NAME) {
            groups.insert(0, Group::default());
        }

        self.plugins = plugins;
        self.regex_plugins = regex_plugins;
        self.ordered_plugin_names = ordered_plugin_names;
        self.messages = messages;
        self.bash_tags = bash_tags;
        self.groups = groups;

        Ok(())
    }

    pub(crate) fn save(
        &self,
        file_path: &Path,
        options: &MetadataWriteOptions,
    ) -> Result<(), WriteMetadataError> {
        logging::trace!("Saving metadata list to: \"{}\"", escape_ascii(file_path));

        let plugins: Vec<_> = self.ordered_plugins_iter().collect();

        let mut emitter = YamlEmitter::new();

        emitter.begin_map();

        if !self.bash_tags.is_empty() {
            emitter.map_key("bash_tags");

            emitter.begin_array();

            for tag in &self.bash_tags {
                emitter.unquoted_str(tag);
            }

            emitter.end_array();
        }

        if self.groups.len() > 1 {
            emitter.map_key("groups");
            write_list(self.groups.iter(), &mut emitter);
        }

        if !self.messages.is_empty() {
            emitter.map_key("globals");
            write_list(self.messages.iter(), &mut emitter);
        }

        if !plugins.is_empty() {
            emitter.map_key("plugins");
            write_list(plugins.into_iter().filter(|p| !p.has_name_only()), &mut emitter);
        }

        emitter.end_map();

        let mut contents = emitter.into_string();
        if contents.is_empty() {
            contents = "{}".into();
        }

        std::fs::write(file_path, contents)
            .map_err(|e| WriteMetadataError::new(file_path.into(), e.into()))?;

        Ok(())
    }

    pub(crate) fn bash_tags(&self) -> &[String] {
        &self.bash_tags
    }

    pub(crate) fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub(crate) fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub(crate) fn ordered_plugins_iter(&self) -> impl Iterator<Item = &PluginMetadata> {
        self.ordered_plugin_names.iter().filter_map(|f| {
            self.plugins.get(f).or_else(|| {
                self.regex_plugins
                    .iter()
                    .find(|r| r.name() == f.as_ref().as_str())
            })
        })
    }

    pub(crate) fn find_plugin(
        &self,
        plugin_name: &str,
    ) -> Result<Option<PluginMetadata>, RegexError> {
        let mut metadata = match self.plugins.get(&Filename::new(plugin_name.to_owned())) {
            Some(m) => m.clone(),
            None => PluginMetadata::new(plugin_name)?,
        };

        // Now we want to also match possibly multiple regex entries.
        for regex_plugin in &self.regex_plugins {
            if regex_plugin.name_matches(plugin_name) {
                metadata.merge_metadata(regex_plugin);
            }
        }

        if metadata.has_name_only() {
            Ok(None)
        } else {
            Ok(Some(metadata))
        }
    }

    pub(crate) fn set_bash_tags(&mut self, bash_tags: Vec<String>) {
        self.bash_tags = bash_tags;
    }

    pub(crate) fn set_groups(&mut self, groups: Vec<Group>) {
        // Ensure that the default group is present.
        let default_group_exists = groups.iter().any(|g| g.name() == Group::DEFAULT_NAME);

        if default_group_exists {
            self.groups = groups;
        } else {
            self.groups.clear();
            self.groups.push(Group::default());
            self.groups.extend(groups);
        }
    }

    pub(crate) fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub(crate) fn set_plugin_metadata(&mut self, plugin_metadata: PluginMetadata) {
        let filename = Arc::new(Filename::new(plugin_metadata.name().to_owned()));

        if plugin_metadata.is_regex_plugin() {
            self.regex_plugins.push(plugin_metadata);
            self.ordered_plugin_names.push(filename);
        } else {
            let old_value = self.plugins.insert(Arc::clone(&filename), plugin_metadata);
            if old_value.is_none() {
                self.ordered_plugin_names.push(filename);
            }
        }
    }

    pub(crate) fn remove_plugin_metadata(&mut self, plugin_name: &str) {
        let filename = Filename::new(plugin_name.to_owned());
        let mut was_removed = self.plugins.remove(&filename).is_some();

        // Only remove regex plugins if no specific plugin was removed, because
        // they're mutually exclusive.
        if !was_removed {
            self.regex_plugins.retain(|p| {
                let equal = unicase::eq(p.name(), plugin_name);
                if equal {
                    was_removed = true;
                }
                !equal
            });
        }

        if was_removed {
            self.ordered_plugin_names
                .retain(|f| f.as_ref() != &filename);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.bash_tags.clear();
        self.groups.clear();
        self.messages.clear();
        self.plugins.clear();
        self.regex_plugins.clear();
        self.ordered_plugin_names.clear();
    }
}

impl std::default::Default for MetadataDocument {
    fn default() -> Self {
        Self {
            bash_tags: Vec::default(),
            groups: vec![Group::default()],
            messages: Vec::default(),
            plugins: HashMap::default(),
            regex_plugins: Vec::default(),
            ordered_plugin_names: Vec::default(),
        }
    }
}

fn write_list<'a, T, U>(values: T, emitter: &mut YamlEmitter)
where
    T: Iterator<Item = &'a U>,
    U: 'a + EmitYaml,
{
    emitter.begin_array();

    for value in values {
        value.emit_yaml(emitter);
    }

    emitter.end_array();
}

/// Describes where a masterlist's prelude was substituted in, in terms of the
/// resulting document's line numbers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct PreludeDiffSpan {
    start_line: usize,
    end_line: usize,
    lines_added_count: isize,
}

struct MasterlistWithReplacedPrelude {
    masterlist: String,
    meta: Option<PreludeDiffSpan>,
}

fn replace_prelude(
    masterlist: String,
    prelude: &str,
) -> Result<MasterlistWithReplacedPrelude, ParseMetadataError> {
    if let Some(SplitMasterlist {
        before_prelude,
        prelude: old_prelude,
        after_prelude,
    }) = split_on_prelude(&masterlist)
    {
        let prelude = indent_prelude(prelude);

        let masterlist = if after_prelude.is_empty() {
            format!("{before_prelude}\n{prelude}")
        } else {
            format!("{before_prelude}\n{prelude}\n{after_prelude}")
        };

        // The old prelude included leading and trailing newlines but the new prelude doesn't.
        let count_modifier = if after_prelude.is_empty() { 1 } else { 2 };
        let old_prelude_line_count = count_lines(old_prelude).saturating_sub(count_modifier);

        // Add one because before_prelude does not include the line break after the prelude: key.
        let prelude_start_line = count_lines(before_prelude) + 1;
        let new_prelude_line_count = count_lines(&prelude);
        // The last line of the prelude.
        let prelude_end_line = prelude_start_line + new_prelude_line_count.saturating_sub(1);

        // TODO: usize::checked_signed_diff() is stable as of Rust 1.91.0, but the org.freedesktop.Sdk.Extension.rust-stable extension for LOOT's Flatpak build environment supplies an older version of Rust, so this can only be updated to use checked_signed_diff() once it's available in that environment.
        let lines_added_count = if new_prelude_line_count >= old_prelude_line_count {
            isize::try_from(new_prelude_line_count - old_prelude_line_count)
        } else {
            isize::try_from(old_prelude_line_count - new_prelude_line_count).map(std::ops::Neg::neg)
        };

        let lines_added_count = lines_added_count.map_err(|_e| {
            ParseMetadataError::new(
                saphyr::Marker::new(before_prelude.len(), prelude_start_line, 0),
                MetadataParsingErrorReason::PreludeSubstitutionOverflow {
                    new_prelude_count: new_prelude_line_count,
                    old_prelude_count: old_prelude_line_count,
                },
            )
        })?;

        Ok(MasterlistWithReplacedPrelude {
            masterlist,
            meta: Some(PreludeDiffSpan {
                start_line: prelude_start_line,
                end_line: prelude_end_line,
                lines_added_count,
            }),
        })
    } else {
        Ok(MasterlistWithReplacedPrelude {
            masterlist,
            meta: None,
        })
    }
}

struct SplitMasterlist<'a> {
    before_prelude: &'a str,
    prelude: &'a str,
    after_prelude: &'a str,
}

fn split_on_prelude(masterlist: &str) -> Option<SplitMasterlist<'_>> {
    let (prefix, remainder) = split_on_prelude_start(masterlist)?;

    let mut iter = remainder.bytes().enumerate().peekable();
    while let Some((index, byte)) = iter.next() {
        if byte != b'\n' {
            continue;
        }

        if let Some((_, next_byte)) = iter.peek()
            && !matches!(next_byte, b' ' | b'#' | b'\n' | b'\r')
        {
            // LIMITATION: Slicing at index should never fail, but the
            // compiler can't see that.
            if let Some((prelude, suffix)) = remainder.split_at_checked(index + 1) {
                return Some(SplitMasterlist {
                    before_prelude: prefix,
                    prelude,
                    after_prelude: suffix,
                });
            }

            logging::error!(
                "Unexpectedly failed to slice the masterlist on a new line at index {}",
                prefix.len() + index
            );
        }
    }

    Some(SplitMasterlist {
        before_prelude: prefix,
        prelude: remainder,
        after_prelude: "",
    })
}

fn count_lines(string: &str) -> usize {
    // lines() ignores a trailing line ending.
    let count = string.lines().count();
    if string.ends_with('\n') {
        count + 1
    } else {
        count
    }
}

/// This includes the line break following the "prelude:" YAML as part of the
/// tuple's second element.
fn split_on_prelude_start(masterlist: &str) -> Option<(&str, &str)> {
    let prelude_on_first_line = "prelude:";
    let prelude_on_new_line = "\nprelude:";

    if let Some(remainder) = masterlist.strip_prefix(prelude_on_first_line) {
        Some((prelude_on_first_line, remainder))
    } else {
        if let Some(pos) = masterlist.find(prelude_on_new_line) {
            let index = pos + prelude_on_new_line.len();
            // LIMITATION: A checked split shouldn't be necessary, but there's
            // no split_inclusive_once() method, so we need to find and split in
            // two steps and there's always the risk of a bug being introduced
            // in the middle.
            if let Some((prefix, remainder)) = masterlist.split_at_checked(index) {
                return Some((prefix, remainder));
            }

            logging::error!(
                "Unexpectedly failed to split the masterlist on the start of the prelude key's value at index {index}"
            );
        }
        None
    }
}

fn indent_prelude(prelude: &str) -> String {
    let prelude = ("  ".to_owned() + &prelude.replace('\n', "\n  "))
        .replace("  \r\n", "\r\n")
        .replace("  \n", "\n");

    if prelude.ends_with("\n  ") {
        prelude.trim_end_matches(' ').to_owned()
    } else {
        prelude
    }
}
