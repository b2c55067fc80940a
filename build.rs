use std::io::Result;

fn main() -> Result<()> {
    #[cfg(feature = "compile-protos")]
    {
        let out_dir = std::path::PathBuf::from("src/proto");
        std::fs::create_dir_all(&out_dir)?;

        prost_build::Config::new()
            .out_dir(&out_dir)
            .compile_protos(&["proto/toniebox.proto"], &["proto/"])?;
    }
    println!("cargo:rerun-if-changed=proto/toniebox.proto");
    Ok(())
}
