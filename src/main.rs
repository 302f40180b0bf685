fn main() {
    if let Err(e) = pie_host::core::Host::run() {
        eprintln!("Host failed: {}", e);
        std::process::exit(1);
    }
}
