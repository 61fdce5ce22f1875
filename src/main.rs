use std::error::Error;
use std::io;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tour_planner::adapters::inbound::ScriptedRecognizer;
use tour_planner::adapters::outbound::{
    init_combined_logger, init_console_logger, parse_level, JsonLinesEventLog, TracingActuator,
};
use tour_planner::application::MissionService;
use tour_planner::Config;

const USAGE: &str = "usage: tour-planner \"x,y,D,id;...\" [id=LABEL,...]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::var_os("TOUR_CONFIG")
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config.toml")).filter(|p| p.exists()));
    let config = Config::load(config_path.as_deref())?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let Some(layout) = args.next() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };
    let labels = args.next().unwrap_or_default();

    let logger = match &config.logging.file {
        Some(path) => init_combined_logger(path, parse_level(&config.logging.level)),
        None => init_console_logger(),
    };
    let service = MissionService::new(config.clone(), logger);

    let (planner, planned) = match service.plan_layout(&layout) {
        Ok(result) => result,
        Err(e) => {
            error!("Planning failed: {}", e);
            return Err(e.into());
        }
    };
    if planned.complete {
        info!("Visit order: {:?}", planned.visit_order);
    } else {
        warn!(
            "Partial tour {:?}, unreachable {:?}",
            planned.visit_order, planned.unreached
        );
    }
    info!(
        "{} commands, planned duration {:.2}s",
        planned.wire_messages.len(),
        planned.total_duration
    );
    println!("{}", planned.wire_messages.join(" "));

    let recognizer = ScriptedRecognizer::from_assignments(&labels)?;
    let mut mission = service.start_mission(planner, Box::new(recognizer), Box::new(TracingActuator));
    let mut sink = JsonLinesEventLog::new(io::stdout().lock());

    let ticks = if config.execution.realtime {
        mission.run_realtime(config.execution.max_ticks, &mut sink).await?
    } else {
        mission.run(config.execution.max_ticks, &mut sink)?
    };

    let pose = mission.executor().pose();
    info!("Finished after {} ticks at {}", ticks, pose);
    if !mission.executor().is_finished() {
        warn!("Tick limit {} reached before the route was exhausted", config.execution.max_ticks);
    }
    Ok(())
}
