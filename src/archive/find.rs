use std::path::{Path, PathBuf};

#[cfg(windows)]
use windows::Win32::Storage::FileSystem::BY_HANDLE_FILE_INFORMATION;

use crate::{GameType, game::GameCache, plugin::has_ascii_extension};

const BSA_FILE_EXTENSION: &str = "bsa";

pub fn find_associated_archives(
    game_type: GameType,
    game_cache: &GameCache,
    plugin_path: &Path,
) -> Vec<PathBuf> {
    match game_type {
        GameType::Morrowind | GameType::OpenMW => Vec::new(),

        // Skyrim (non-SE) plugins can only load BSAs that have exactly the same
        // basename, ignoring file extensions.
        GameType::Skyrim => find_associated_archive(plugin_path),

        // Skyrim SE can load BSAs that have exactly the same basename, ignoring
        // file extensions, and also BSAs with filenames of the form "<basename>
        // - Textures.bsa" (case-insensitively). This assumes that Skyrim VR
        // works the same way as Skyrim SE.
        GameType::SkyrimSE | GameType::SkyrimVR => find_associated_archives_with_suffixes(plugin_path, BSA_FILE_EXTENSION, &["", " - Textures"]),

        // Oblivion .esp files can load archives which begin with the plugin
        // basename.
        GameType::Oblivion | GameType::OblivionRemastered => {
            if has_ascii_extension(plugin_path, "esp") {
                find_associated_archives_with_arbitrary_suffixes(plugin_path, game_cache)
            } else {
                Vec::new()
            }
        },

        // FO3, FNV, FO4 plugins can load archives which begin with the plugin
        // basename. This assumes that FO4 VR works the same way as FO4.
        GameType::Fallout3 | GameType::FalloutNV | GameType::Fallout4 | GameType::Fallout4VR =>
            find_associated_archives_with_arbitrary_suffixes(plugin_path, game_cache)
        ,

        // The game will load a BA2 that's suffixed with " - Voices_<language>"
        // where <language> is whatever language Starfield is configured to use
        // (sLanguage in the ini), so this isn't exactly correct but will work
        // so long as a plugin with voices has voices for English, which seems
        // likely.
        GameType::Starfield => find_associated_archives_with_suffixes(plugin_path, "ba2", &[" - Main", " - Textures", " - Localization", " - Voices_en"]),
    }
}

fn find_associated_archive(plugin_path: &Path) -> Vec<PathBuf> {
    let archive_path = plugin_path.with_extension(BSA_FILE_EXTENSION);

    if archive_path.exists() {
        vec![archive_path]
    } else {
        Vec::new()
    }
}

fn find_associated_archives_with_suffixes(
    plugin_path: &Path,
    archive_extension: &str,
    supported_suffixes: &[&str],
) -> Vec<PathBuf> {
    let Some(file_stem) = plugin_path.file_stem() else {
        return Vec::new();
    };

    supported_suffixes
        .iter()
        .map(|suffix| {
            let mut filename = file_stem.to_os_string();
            filename.push(suffix);
            filename.push(".");
            filename.push(archive_extension);

            plugin_path.with_file_name(filename)
        })
        .filter(|p| p.exists())
        .collect()
}

fn find_associated_archives_with_arbitrary_suffixes(
    plugin_path: &Path,
    game_cache: &GameCache,
) -> Vec<PathBuf> {
    let plugin_stem_len = match plugin_path.file_stem().and_then(|s| s.to_str()) {
        Some(s) => s.len(),
        None => return Vec::new(),
    };
    let Some(plugin_extension) = plugin_path.extension() else {
        return Vec::new();
    };

    game_cache
        .archives_iter()
        .filter(|path| {
            // Need to check if it starts with the given plugin's basename,
            // but case insensitively. This is hard to do accurately, so
            // instead check if the plugin with the same length basename and
            // and the given plugin's file extension is equivalent.
            let Some(archive_filename) = path.file_name().and_then(|s| s.to_str()) else {
                return false;
            };

            // Can't just slice the archive filename to the same length as the plugin file stem directly because that might not slice on a character boundary, so truncate the byte slice and then check it's still valid UTF-8.
            if archive_filename.len() < plugin_stem_len {
                return false;
            }

            let Some(filename) = archive_filename.get(..plugin_stem_len) else {
                return false;
            };

            let archive_plugin_path = plugin_path
                .with_file_name(filename)
                .with_extension(plugin_extension);

            are_file_paths_equivalent(&archive_plugin_path, plugin_path)
        })
        .cloned()
        .collect()
}

#[cfg(windows)]
fn are_file_paths_equivalent(lhs: &Path, rhs: &Path) -> bool {
    use std::fs::File;

    if lhs == rhs {
        return true;
    }

    let Ok(lhs_file) = File::open(lhs) else {
        return false;
    };

    let Ok(rhs_file) = File::open(rhs) else {
        return false;
    };

    let Some(lhs_info) = get_file_info(&lhs_file) else {
        return false;
    };

    let Some(rhs_info) = get_file_info(&rhs_file) else {
        return false;
    };

    lhs_info.dwVolumeSerialNumber == rhs_info.dwVolumeSerialNumber
        && lhs_info.nFileIndexHigh == rhs_info.nFileIndexHigh
        && lhs_info.nFileIndexLow == rhs_info.nFileIndexLow
}

#[cfg(windows)]
fn get_file_info(file: &std::fs::File) -> Option<BY_HANDLE_FILE_INFORMATION> {
    use std::os::windows::io::AsRawHandle;
    use windows::Win32::{Foundation::HANDLE, Storage::FileSystem::GetFileInformationByHandle};

    let mut info = BY_HANDLE_FILE_INFORMATION::default();

    // SAFETY: This is safe because the file handles and the info struct pointers are all valid until this function exits.
    #[expect(
        unsafe_code,
        reason = "There is currently no way to get this data safely"
    )]
    unsafe {
        GetFileInformationByHandle(HANDLE(file.as_raw_handle()), &mut info)
            .is_ok()
            .then_some(info)
    }
}

#[cfg(not(windows))]
fn are_file_paths_equivalent(lhs: &Path, rhs: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    if lhs == rhs {
        return true;
    }

    let Ok(lhs_metadata) = lhs.metadata() else {
        return false;
    };

    let Ok(rhs_metadata) = rhs.metadata() else {
        return false;
    };

    lhs_metadata.dev() == rhs_metadata.dev() && lhs_metadata.ino() == rhs_metadata.ino()
}
