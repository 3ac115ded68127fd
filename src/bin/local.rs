use shield_lib::backends::Local;
use shield_lib::plugin::run_main;

fn main() {
    run_main(&Local)
}
