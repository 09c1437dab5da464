//! Colored, human-readable rendering of coordinator API responses.

use colored::Colorize;

pub fn print_submit_result(value: &serde_json::Value) {
    let job_id = value["job_id"].as_str().unwrap_or("?");
    let wait = value["estimated_wait_time"].as_f64().unwrap_or(0.0);
    println!(
        "{} job {} queued (estimated wait {:.0}s)",
        "✓".green().bold(),
        job_id.cyan(),
        wait
    );
}

pub fn print_status(value: &serde_json::Value) {
    let nodes_online = value["stats"]["nodes_online"].as_u64().unwrap_or(0);
    let total = value["stats"]["total_calculations"].as_u64().unwrap_or(0);
    let gpu = value["stats"]["gpu_calculations"].as_u64().unwrap_or(0);
    let cpu = value["stats"]["cpu_calculations"].as_u64().unwrap_or(0);
    let active = value["active_jobs"].as_u64().unwrap_or(0);
    let completed = value["completed_jobs"].as_u64().unwrap_or(0);

    println!("{}", "cluster status".bold());
    println!("  nodes online:        {}", nodes_online.to_string().green());
    println!("  active jobs:         {active}");
    println!("  completed+failed:    {completed}");
    println!("  total calculations:  {total} (gpu {gpu}, cpu {cpu})");

    if let Some(depths) = value.get("queue_depths") {
        println!(
            "  queue depths:        priority={} collatz={} thread={}",
            depths["priority"], depths["collatz"], depths["thread"]
        );
    }

    if let Some(nodes) = value.get("nodes").and_then(|n| n.as_array()) {
        println!("  nodes:");
        for node in nodes {
            let status = node["status"].as_str().unwrap_or("?");
            let colored_status = if status == "online" { status.green() } else { status.red() };
            println!(
                "    {:<12} {:<10} gpu={:<5} load={:.2} completed={}",
                node["id"].as_str().unwrap_or("?"),
                colored_status,
                node["gpu_enabled"].as_bool().unwrap_or(false),
                node["load_score"].as_f64().unwrap_or(0.0),
                node["jobs_completed"].as_u64().unwrap_or(0),
            );
        }
    }
}

pub fn print_json(label: &str, value: &serde_json::Value) {
    println!("{}:", label.bold());
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}
