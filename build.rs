use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

/// Directories whose contents end up in the binary or next to it. Cargo
/// watches a directory recursively when given its path.
const WATCHED: [&str; 2] = ["templates", "assets"];

fn main() {
    for dir in WATCHED {
        println!("cargo:rerun-if-changed={}", dir);
    }
    println!("cargo:rerun-if-env-changed=GYM_ADMIN_BUILD_TAG");

    println!("cargo:rustc-env=GYM_ADMIN_BUILD_ID={}", build_id());
}

// `<version>+<tag>`, where the tag comes from the environment (CI sets it)
// or falls back to the build time in seconds.
fn build_id() -> String {
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let tag = env::var("GYM_ADMIN_BUILD_TAG")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs().to_string())
                .unwrap_or_else(|_| "dev".to_string())
        });
    format!("{}+{}", version, tag.trim())
}
