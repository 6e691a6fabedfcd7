fn main() {
    println!("cargo:rerun-if-changed=wrapper.h");
    println!("cargo:rerun-if-env-changed=LIBVMI_LIB_DIR");
    println!("cargo:rerun-if-env-changed=LIBVMI_INCLUDE_DIR");

    generate_libvmi_bindings();
}

#[cfg(feature = "libvmi")]
fn generate_libvmi_bindings() {
    use std::env;
    use std::path::PathBuf;

    // Tell cargo to tell rustc to link the vmi library
    println!("cargo:rustc-link-lib=vmi");

    if let Ok(lib_dir) = env::var("LIBVMI_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", lib_dir);
    }

    let mut builder = bindgen::Builder::default()
        .header("wrapper.h")
        .allowlist_function("vmi_.*")
        .allowlist_type("vmi_.*|status_t|addr_t")
        .allowlist_var("VMI_.*")
        // VMI_SUCCESS instead of status_VMI_SUCCESS
        .prepend_enum_name(false)
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()));

    if let Ok(include_dir) = env::var("LIBVMI_INCLUDE_DIR") {
        builder = builder.clang_arg(format!("-I{}", include_dir));
    }

    let bindings = builder
        .generate()
        .expect("Unable to generate libvmi bindings");

    // Write the bindings to the $OUT_DIR/libvmi_bindings.rs file.
    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings
        .write_to_file(out_path.join("libvmi_bindings.rs"))
        .expect("Couldn't write bindings!");
}

#[cfg(not(feature = "libvmi"))]
fn generate_libvmi_bindings() {}
