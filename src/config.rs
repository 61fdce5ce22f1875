use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::ApplicationResult;
use crate::domains::arena::{ArenaSpec, Pose, TurnRadii};
use crate::domains::execution::ExecutionSettings;
use crate::domains::motion::Kinematics;
use crate::domains::path_planning::SearchSettings;
use crate::domains::route_planning::{PlannerSettings, TourStrategy};

/// Prefix of environment overrides, e.g. `TOUR_PLANNER__MAX_RETRY=3`.
pub const ENV_PREFIX: &str = "TOUR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub arena: ArenaConfig,
    pub robot: RobotConfig,
    pub obstacle: ObstacleConfig,
    pub planner: PlannerConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f64,
    pub height: f64,
    pub cell_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub start_x: f64,
    pub start_y: f64,
    pub start_angle: f64,
    /// Side of the square robot footprint.
    pub footprint: f64,
    pub speed: f64,
    pub tick_rate: f64,
    pub turn_radius: f64,
    pub drift_radius: f64,
    pub scan_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub length: f64,
    pub safety_margin: f64,
    pub approach_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub max_retry: usize,
    pub max_exhaustive_obstacles: usize,
    pub tour_strategy: TourStrategy,
    pub turn_cost_multiplier: f64,
    pub turn_check_steps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub perimeter_leg_distance: f64,
    pub perimeter_poll_interval: u32,
    /// Pace the tick loop at `robot.tick_rate` instead of running flat out.
    pub realtime: bool,
    pub max_ticks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Log file for the fast_log adapter; console only when unset.
    pub file: Option<String>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
            cell_size: 10.0,
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            start_x: 15.0,
            start_y: 15.0,
            start_angle: 90.0,
            footprint: 30.0,
            speed: 50.0,
            tick_rate: 50.0,
            turn_radius: 20.0,
            drift_radius: 30.0,
            scan_time: 0.25,
        }
    }
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            length: 10.0,
            safety_margin: 15.0,
            approach_distance: 30.0,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_retry: 10,
            max_exhaustive_obstacles: 8,
            tour_strategy: TourStrategy::Exhaustive,
            turn_cost_multiplier: 3.0,
            turn_check_steps: 5,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            perimeter_leg_distance: 40.0,
            perimeter_poll_interval: 10,
            realtime: false,
            max_ticks: 200_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the TOML file at `path` if given, then `TOUR_*`
    /// environment variables with `__` between section and key.
    pub fn load(path: Option<&Path>) -> ApplicationResult<Self> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&Config::default())?);
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.arena.width > 0.0 && self.arena.height > 0.0 && self.arena.cell_size > 0.0,
            "arena dimensions must be positive"
        );
        ensure!(
            self.robot.speed > 0.0 && self.robot.tick_rate > 0.0,
            "robot speed and tick rate must be positive"
        );
        ensure!(
            self.robot.turn_radius > 0.0 && self.robot.drift_radius > 0.0,
            "turn radii must be positive"
        );
        ensure!(self.robot.scan_time >= 0.0, "scan time cannot be negative");
        ensure!(self.planner.max_retry > 0, "planner.max_retry must be at least 1");
        ensure!(
            self.planner.turn_cost_multiplier > 1.0,
            "planner.turn_cost_multiplier must exceed 1 so turns cost more than straights"
        );
        let radii = self.kinematics().radii;
        let chord = radii.turn.hypot(radii.drift);
        let turn_cost = self.planner_settings().search.turn_cost(radii);
        ensure!(
            turn_cost > chord,
            "planner.turn_cost_multiplier gives a turn cost of {:.1}, below the {:.1} cm the turn covers",
            turn_cost,
            chord
        );
        ensure!(
            self.execution.perimeter_leg_distance > 0.0,
            "execution.perimeter_leg_distance must be positive"
        );
        ensure!(
            self.execution.perimeter_poll_interval > 0,
            "execution.perimeter_poll_interval must be at least 1"
        );
        let clearance = self.obstacle_clearance();
        ensure!(
            self.obstacle.approach_distance >= clearance,
            "approach distance {} lies inside the obstacle safety zone ({})",
            self.obstacle.approach_distance,
            clearance
        );
        Ok(())
    }

    fn obstacle_clearance(&self) -> f64 {
        self.obstacle.length / 2.0 + self.obstacle.safety_margin
    }

    pub fn start_pose(&self) -> Pose {
        Pose::new(self.robot.start_x, self.robot.start_y, self.robot.start_angle)
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            speed: self.robot.speed,
            tick_rate: self.robot.tick_rate,
            radii: TurnRadii {
                turn: self.robot.turn_radius,
                drift: self.robot.drift_radius,
            },
            scan_time: self.robot.scan_time,
        }
    }

    pub fn arena_spec(&self) -> ArenaSpec {
        ArenaSpec {
            width: self.arena.width,
            height: self.arena.height,
            cell_size: self.arena.cell_size,
            robot_margin: self.robot.footprint / 2.0,
            obstacle_clearance: self.obstacle_clearance(),
            approach_distance: self.obstacle.approach_distance,
        }
    }

    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            max_retry: self.planner.max_retry,
            max_exhaustive_obstacles: self.planner.max_exhaustive_obstacles,
            tour_strategy: self.planner.tour_strategy,
            search: SearchSettings {
                turn_cost_multiplier: self.planner.turn_cost_multiplier,
                turn_check_steps: self.planner.turn_check_steps,
            },
        }
    }

    pub fn execution_settings(&self) -> ExecutionSettings {
        ExecutionSettings {
            perimeter_leg_distance: self.execution.perimeter_leg_distance,
            perimeter_poll_interval: self.execution.perimeter_poll_interval,
        }
    }
}
