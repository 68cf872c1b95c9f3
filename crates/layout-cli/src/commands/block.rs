use layout_core::models::{machine_block, UNKNOWN_BLOCK};

pub fn describe_block(machine: i64) -> String {
    match machine_block(machine) {
        UNKNOWN_BLOCK => format!("Machine {machine} is outside every layout block"),
        block => format!("Machine {machine} is in block {block}"),
    }
}

pub fn run_block(machine: i64) {
    println!("{}", describe_block(machine));
}
