use std::env;

fn main() {
    let version =
        env::var("PRODUCE_VERSION").unwrap_or_else(|_| env::var("CARGO_PKG_VERSION").unwrap());
    println!("cargo:rerun-if-env-changed=PRODUCE_VERSION");
    println!("cargo:rustc-env=PRODUCE_VERSION={version}");
}
