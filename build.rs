use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Copy vocabulary assets next to the executable
    copy_config();
}

/// Copies the config folder to the target directory so the executable can find its assets.
fn copy_config() {
    let out_dir = env::var("OUT_DIR").unwrap();
    // OUT_DIR is something like target/release/build/helldiver-autoassets-xxx/out
    // We need to go up to target/release (or target/debug)
    let out_path = Path::new(&out_dir);
    let target_dir = out_path
        .ancestors()
        .nth(3) // Go up 3 levels: out -> hash -> build -> release
        .expect("Could not find target directory");

    let config_src = Path::new("config");
    let config_dst = target_dir.join("config");

    if config_src.exists() {
        copy_dir_recursive(config_src, &config_dst);
        // Tell Cargo to re-run if assets change
        println!("cargo:rerun-if-changed=config/");
    }
}

/// Recursively copies a directory and its contents.
fn copy_dir_recursive(src: &Path, dst: &Path) {
    let _ = fs::create_dir_all(dst);

    if let Ok(entries) = fs::read_dir(src) {
        for entry in entries.flatten() {
            let src_path = entry.path();
            let Some(file_name) = src_path.file_name() else {
                continue;
            };
            let dst_path = dst.join(file_name);

            if src_path.is_dir() {
                copy_dir_recursive(&src_path, &dst_path);
            } else {
                let _ = fs::copy(&src_path, &dst_path);
            }
        }
    }
}
