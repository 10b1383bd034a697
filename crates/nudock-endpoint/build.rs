use std::env;
use std::path::PathBuf;

fn main() {
    // Installed schema location; defaults to the repository's `schemas/`.
    let schemas_dir = env::var("NUDOCK_SCHEMAS_DIR").unwrap_or_else(|_| {
        let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
        manifest_dir
            .join("..")
            .join("..")
            .join("schemas")
            .display()
            .to_string()
    });
    println!("cargo:rustc-env=NUDOCK_SCHEMAS_DIR={schemas_dir}");

    let version = env::var("NUDOCK_VERSION")
        .or_else(|_| env::var("CARGO_PKG_VERSION"))
        .unwrap_or_else(|_| "0.0.0".to_string());
    println!("cargo:rustc-env=NUDOCK_VERSION={version}");

    println!("cargo:rerun-if-env-changed=NUDOCK_SCHEMAS_DIR");
    println!("cargo:rerun-if-env-changed=NUDOCK_VERSION");
}
