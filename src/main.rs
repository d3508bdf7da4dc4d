fn main() {
    if let Err(err) = sfc_scl::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
