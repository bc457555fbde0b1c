use risk_schedule::{
    CancellationToken, Project, ThresholdConfig, load_project_from_json, render_df_as_text_table,
    run_checks, save_project_to_json, schedule_dataframe, simulate, simulation_dataframe,
};

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  cli schedule <project.json> [--save <out.json>]");
    eprintln!("  cli check <project.json> --long-lag <days> --large-margin <days> --long-duration <days>");
    eprintln!("  cli simulate <project.json> --iterations <n> --seed <n> [--percentiles 50,80,90]");
    eprintln!("  cli serve <project.json> [--addr <host:port>]");
    std::process::exit(2);
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1).cloned())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    flag_value(args, flag).and_then(|value| value.parse().ok())
}

fn load_or_exit(path: &str) -> Project {
    match load_project_from_json(path) {
        Ok(project) => project,
        Err(err) => {
            eprintln!("Error loading {path}: {err}");
            std::process::exit(1);
        }
    }
}

fn cmd_schedule(path: &str, args: &[String]) {
    let mut project = load_or_exit(path);
    match project.schedule() {
        Ok(summary) => {
            match schedule_dataframe(&project) {
                Ok(df) => println!("{}", render_df_as_text_table(&df)),
                Err(err) => eprintln!("Error rendering schedule: {err}"),
            }
            println!("{}", summary.to_cli_summary());
            if let Some(out) = flag_value(args, "--save") {
                match save_project_to_json(&project, &out) {
                    Ok(_) => println!("Project saved to {out}."),
                    Err(err) => eprintln!("Error saving project: {err}"),
                }
            }
        }
        Err(err) => {
            eprintln!("Scheduling failed: {err}");
            std::process::exit(1);
        }
    }
}

fn cmd_check(path: &str, args: &[String]) {
    let mut project = load_or_exit(path);
    if let Err(err) = project.schedule() {
        eprintln!("Scheduling failed: {err}");
        std::process::exit(1);
    }
    let config = ThresholdConfig {
        long_lag_days: parse_flag(args, "--long-lag").unwrap_or_else(|| usage()),
        large_margin_days: parse_flag(args, "--large-margin").unwrap_or_else(|| usage()),
        long_duration_days: parse_flag(args, "--long-duration").unwrap_or_else(|| usage()),
    };
    match run_checks(&project, &config) {
        Ok(findings) => {
            if findings.is_empty() {
                println!("No findings.");
            }
            for finding in findings {
                println!(
                    "[{:?}] activity {} {}: {}",
                    finding.severity,
                    finding.activity_id,
                    finding.kind.as_str(),
                    finding.message
                );
            }
        }
        Err(err) => {
            eprintln!("Check failed: {err}");
            std::process::exit(1);
        }
    }
}

fn cmd_simulate(path: &str, args: &[String]) {
    let mut project = load_or_exit(path);
    if let Err(err) = project.schedule() {
        eprintln!("Scheduling failed: {err}");
        std::process::exit(1);
    }

    // Distributions ride along in the project file.
    let distributions = match std::fs::read_to_string(path)
        .ok()
        .and_then(|contents| serde_json::from_str::<serde_json::Value>(&contents).ok())
        .and_then(|value| value.get("distributions").cloned())
    {
        Some(value) => serde_json::from_value(value).unwrap_or_default(),
        None => Vec::new(),
    };

    let iterations = parse_flag(args, "--iterations").unwrap_or(1_000);
    let seed = parse_flag(args, "--seed").unwrap_or(42);
    let cancel = CancellationToken::new();

    match simulate(&project, &distributions, iterations, seed, &cancel) {
        Ok(result) => {
            match simulation_dataframe(&result) {
                Ok(df) => println!("{}", render_df_as_text_table(&df)),
                Err(err) => eprintln!("Error rendering simulation: {err}"),
            }
            println!(
                "{} of {} iterations completed{}",
                result.iterations_completed,
                result.iterations_requested,
                if result.cancelled { " (cancelled)" } else { "" }
            );
            let wanted = flag_value(args, "--percentiles").unwrap_or_else(|| "50,80,90".into());
            for token in wanted.split(',') {
                if let Ok(p) = token.trim().parse::<f64>() {
                    if let Some(days) = result.percentile(p) {
                        println!("P{:>2}: {} days", p as i64, days);
                    }
                }
            }
        }
        Err(err) => {
            eprintln!("Simulation failed: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "http_api")]
fn cmd_serve(path: &str, args: &[String]) {
    let project = load_or_exit(path);
    let addr: std::net::SocketAddr = flag_value(args, "--addr")
        .unwrap_or_else(|| "0.0.0.0:3000".to_string())
        .parse()
        .unwrap_or_else(|_| usage());
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error starting runtime: {err}");
            std::process::exit(1);
        }
    };
    println!("risk-schedule HTTP API listening on http://{addr}");
    if let Err(err) = runtime.block_on(risk_schedule::http_api::serve(addr, project)) {
        eprintln!("Server error: {err}");
        std::process::exit(1);
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, path) = match (args.first(), args.get(1)) {
        (Some(command), Some(path)) => (command.as_str(), path.as_str()),
        _ => usage(),
    };
    let rest = &args[2..];

    match command {
        "schedule" => cmd_schedule(path, rest),
        "check" => cmd_check(path, rest),
        "simulate" => cmd_simulate(path, rest),
        #[cfg(feature = "http_api")]
        "serve" => cmd_serve(path, rest),
        #[cfg(not(feature = "http_api"))]
        "serve" => {
            eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
            std::process::exit(1);
        }
        _ => usage(),
    }
}
