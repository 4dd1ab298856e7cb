//! Delivery scheduling engine and its configuration.
//!
//! `SchedulerEngine` keeps the priority chain and the ETA index in step:
//! it assigns priorities, derives ETAs from the order ahead in the chain,
//! repairs placement when the order ahead is already overdue, cascades ETA
//! changes backwards after every mutation, and sweeps due orders.
//!
//! # Heuristic
//!
//! Placement repair is a greedy tie-break, not an optimal reordering. It is
//! bounded by `SchedulerConfig::max_repair_steps`.

mod config;
mod engine;

pub use config::SchedulerConfig;
pub use engine::{RunSummary, SchedulerEngine};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_script;

    #[test]
    fn test_script_end_to_end() {
        let script = "\
createOrder(1, 0, 50, 10)
createOrder(2, 1, 50, 10)
print(0, 100)
getRankOfOrder(2)
print(1)
cancelOrder(1, 12)
print(5, 9)
updateTime(2, 13, 15)
Quit()
";
        let commands = parse_script(script).unwrap();
        let mut engine = SchedulerEngine::new();
        let lines: Vec<String> = engine
            .run(&commands)
            .iter()
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            lines,
            vec![
                "Order 1 has been created - ETA: 10",
                "Order 2 has been created - ETA: 30",
                "[1, 2]",
                "Order 2 will be delivered after 1 orders.",
                "[1, 0, 50, 10, 10]",
                "Cannot cancel. Order 1 has already been delivered",
                "Order 1 has been delivered at time 10",
                "There are no orders in that time period",
                "Updated ETAs: [2: 35]",
                "Order 2 will be delivered at time 35",
            ]
        );
    }
}
