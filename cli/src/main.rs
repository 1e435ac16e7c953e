//! Binary entrypoint for fontpick (made by FontLab https://www.fontlab.com/)

fn main() {
    if let Err(err) = fontpick_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
