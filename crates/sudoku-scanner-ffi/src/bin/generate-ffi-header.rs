//! Write the C header for the scanner ABI.
//!
//! Usage: `cargo run -p sudoku-scanner-ffi --features generate-header --bin generate-ffi-header [OUT]`
//! (default `include/sudoku_scanner.h` inside the crate).

use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let crate_dir = env!("CARGO_MANIFEST_DIR");
    let out = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(crate_dir).join("include/sudoku_scanner.h"));
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }

    cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("SUDOKU_SCANNER_H")
        .with_documentation(true)
        .with_cpp_compat(true)
        .generate()?
        .write_to_file(&out);

    println!("wrote {}", out.display());
    Ok(())
}
