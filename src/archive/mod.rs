mod ba2;
mod bsa;
mod error;
mod find;
mod parse;

use std::collections::{BTreeMap, BTreeSet};

pub use find::find_associated_archives;
pub use parse::assets_in_archives;

pub fn do_assets_overlap(
    assets: &BTreeMap<u64, BTreeSet<u64>>,
    other_assets: &BTreeMap<u64, BTreeSet<u64>>,
) -> bool {
    let mut assets_iter = assets.iter();
    let mut other_assets_iter = other_assets.iter();

    let mut assets = assets_iter.next();
    let mut other_assets = other_assets_iter.next();
    while let (Some((folder, files)), Some((other_folder, other_files))) = (assets, other_assets) {
        if folder < other_folder {
            assets = assets_iter.next();
        } else if folder > other_folder {
            other_assets = other_assets_iter.next();
        } else if files.intersection(other_files).next().is_some() {
            return true;
        } else {
            // The folder hashes are equal but they don't contain any of the same
            // file hashes, move on to the next folder. It doesn't matter which
            // iterator gets incremented.
            assets = assets_iter.next();
        }
    }

    false
}
