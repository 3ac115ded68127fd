use shield_lib::backends::MySql;
use shield_lib::plugin::run_main;

fn main() {
    run_main(&MySql)
}
