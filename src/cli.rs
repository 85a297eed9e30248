/// CLI help and version text

use crate::config::{
    ENV_HTTP_TIMEOUT, ENV_LIBRE_API_KEY, ENV_LIBRE_URL, ENV_OCR_TIMEOUT, ENV_SOURCE_LANG,
    ENV_TARGET_LANG, ENV_TRANSLATOR,
};

pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!("SnapLingo v{}", version);
    println!("Select a region of the screen, read its text and translate it");
    println!();
    println!("USAGE:");
    println!("    snaplingo [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -s, --source-lang <LANG>    Tesseract language of the text (default: dan)");
    println!("    -t, --target-lang <LANG>    Language to translate into (default: en)");
    println!("        --timeout <SECS>        Text recognition timeout (default: 5)");
    println!("        --translator <NAME>     google or libre (default: google)");
    println!("    -h, --help                  Print this help message");
    println!("    -V, --version               Print version information");
    println!();
    println!("KEYS:");
    println!("    Drag with the left button to select, Esc to cancel");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    {:<28} - Same as --source-lang", ENV_SOURCE_LANG);
    println!("    {:<28} - Same as --target-lang", ENV_TARGET_LANG);
    println!("    {:<28} - Same as --timeout", ENV_OCR_TIMEOUT);
    println!("    {:<28} - Same as --translator", ENV_TRANSLATOR);
    println!("    {:<28} - LibreTranslate endpoint", ENV_LIBRE_URL);
    println!("    {:<28} - LibreTranslate API key", ENV_LIBRE_API_KEY);
    println!("    {:<28} - Translation request timeout in seconds (default: 10)", ENV_HTTP_TIMEOUT);
    println!("    {:<28} - Log level (error/warn/info/debug/trace)", "RUST_LOG");
}

pub fn print_version() {
    println!("SnapLingo v{}", env!("CARGO_PKG_VERSION"));
}
