fn main() {
    if let Err(err) = treatment_atlas::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
