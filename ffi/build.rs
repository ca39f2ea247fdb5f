use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let (Ok(crate_dir), Ok(out_dir)) = (env::var("CARGO_MANIFEST_DIR"), env::var("OUT_DIR")) else {
        println!("cargo:warning=header not generated: CARGO_MANIFEST_DIR or OUT_DIR unset");
        return;
    };
    let out = PathBuf::from(out_dir).join("include").join("lbs_ffi.h");

    let bindings = match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("LBS_FFI_H")
        .generate()
    {
        Ok(bindings) => bindings,
        Err(e) => {
            println!("cargo:warning=header not generated: {e}");
            return;
        }
    };

    if let Some(dir) = out.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            println!("cargo:warning=cannot create {}: {e}", dir.display());
            return;
        }
    }
    match std::fs::File::create(&out) {
        Ok(file) => bindings.write(file),
        Err(e) => println!("cargo:warning=cannot write {}: {e}", out.display()),
    }
}
