fn main() {
    if let Err(e) = pointlab_lib::run() {
        log::error!("pointlab: {e}");
        eprintln!("pointlab: {e}");
        std::process::exit(1);
    }
}
