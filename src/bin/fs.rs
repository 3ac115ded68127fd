use shield_lib::backends::Fs;
use shield_lib::plugin::run_main;

fn main() {
    run_main(&Fs)
}
