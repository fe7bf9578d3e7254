fn main() {
    if let Err(err) = taxonomy_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
