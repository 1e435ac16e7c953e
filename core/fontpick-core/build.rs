/// Build script for fontpick-core.
///
/// Only asks Cargo to rerun when the script itself changes. The snapshot
/// format version lives in `src/snapshot.rs`, not here.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
}
