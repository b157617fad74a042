fn main() {
    println!("cargo:rerun-if-changed=schema/messages.capnp");

    capnpc::CompilerCommand::new()
        .src_prefix("schema")
        .file("schema/messages.capnp")
        .run()
        .expect("capnp compile: schema/messages.capnp");
}
