fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::compile_protos("protos/cog.proto")?;
    println!("cargo:rerun-if-changed=protos/cog.proto");
    Ok(())
}
