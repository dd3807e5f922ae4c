//! Configuration fuzz target: feed arbitrary bytes to the declaration parser and layout builder.
//! Neither may panic; malformed input must come back as an error.
//! Build with: cargo fuzz run config_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(layout) = netvar::load_layout(s) {
        let _ = netvar::dump::format_layout(&layout);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run config_fuzz");
}
