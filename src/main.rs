fn main() {
    if let Err(err) = research_tree::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
