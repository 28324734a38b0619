fn main() {
    if let Err(err) = ancestry_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
