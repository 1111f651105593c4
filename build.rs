use std::fs;

/// Release guard: the `VERSION` file and the package version must agree.
fn main() {
    println!("cargo:rerun-if-changed=VERSION");

    let recorded = match fs::read_to_string("VERSION") {
        Ok(contents) => contents.trim().to_string(),
        Err(e) => panic!("cannot read VERSION ({}); it must hold the package version", e),
    };

    let parts: Vec<&str> = recorded.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.parse::<u64>().is_err()) {
        panic!("VERSION must be MAJOR.MINOR.PATCH, found {:?}", recorded);
    }

    let package = env!("CARGO_PKG_VERSION");
    if recorded != package {
        panic!(
            "\n\n\
            ❌ VERSION MISMATCH!\n\
            VERSION file:        {}\n\
            Cargo.toml [package]: {}\n\n",
            recorded, package
        );
    }
}
